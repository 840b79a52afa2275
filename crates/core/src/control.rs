// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared control flags between the controller and the supervisor loop.
//!
//! | flag                  | semantics                                     |
//! |-----------------------|-----------------------------------------------|
//! | `shutdown_requested`  | one-way; once set it never clears             |
//! | `restart_requested`   | edge-triggered; cleared by [`ControlFlags::take_restart_request`] |
//! | `desired_running`     | level; toggled by start/stop commands         |
//!
//! Every mutation wakes the supervisor so it reacts before its next tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Flags {
    shutdown_requested: AtomicBool,
    restart_requested: AtomicBool,
    desired_running: AtomicBool,
    changed: Notify,
    shutdown: Notify,
}

/// Cloneable handle to the process-wide control flags.
#[derive(Debug, Clone, Default)]
pub struct ControlFlags {
    inner: Arc<Flags>,
}

impl ControlFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_shutdown(&self) {
        self.inner.shutdown_requested.store(true, Ordering::SeqCst);
        self.inner.shutdown.notify_waiters();
        self.wake();
    }

    /// Resolve once shutdown has been requested.
    ///
    /// Any number of tasks may wait; none of them consumes the supervisor's
    /// change notification.
    pub async fn wait_for_shutdown(&self) {
        let notified = self.inner.shutdown.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_shutdown_requested() {
            return;
        }
        notified.await;
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.inner.shutdown_requested.load(Ordering::SeqCst)
    }

    pub fn request_restart(&self) {
        self.inner.restart_requested.store(true, Ordering::SeqCst);
        self.wake();
    }

    /// Consume a pending restart request, returning whether one was pending.
    pub fn take_restart_request(&self) -> bool {
        self.inner.restart_requested.swap(false, Ordering::SeqCst)
    }

    pub fn is_restart_requested(&self) -> bool {
        self.inner.restart_requested.load(Ordering::SeqCst)
    }

    pub fn set_desired_running(&self, desired: bool) {
        self.inner.desired_running.store(desired, Ordering::SeqCst);
        self.wake();
    }

    pub fn desired_running(&self) -> bool {
        self.inner.desired_running.load(Ordering::SeqCst)
    }

    /// Wake the supervisor without changing any flag.
    pub fn wake(&self) {
        self.inner.changed.notify_one();
    }

    /// Sleep for `timeout` or until a flag changes, whichever comes first.
    ///
    /// Returns `true` when woken by a change.
    pub async fn wait_for_change(&self, timeout: Duration) -> bool {
        tokio::select! {
            _ = self.inner.changed.notified() => true,
            _ = tokio::time::sleep(timeout) => false,
        }
    }
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
