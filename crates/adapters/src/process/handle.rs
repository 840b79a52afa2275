// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ownership wrapper around the single supervised child.
//!
//! ```text
//!   Stopped ──launch──▶ Starting ──spawned──▶ Running
//!      ▲                    │                    │
//!      └──── spawn error ───┘          request_stop / exit
//!      ▲                                         │
//!      └──────────────── Stopping ◀──────────────┘
//! ```

use super::{
    ChildProcess, ExitPoll, LaunchCommand, LaunchError, ProcessAdapter, ProcessState, StopOutcome,
};
use crate::env;
use chrono::{DateTime, Local};
use sk_core::LogChannel;
use std::time::Duration;

/// Owns at most one child process spawned through `A`.
pub struct ProcessHandle<A: ProcessAdapter> {
    adapter: A,
    logs: LogChannel,
    state: ProcessState,
    child: Option<A::Child>,
    started_at: Option<DateTime<Local>>,
}

impl<A: ProcessAdapter> ProcessHandle<A> {
    pub fn new(adapter: A, logs: LogChannel) -> Self {
        Self {
            adapter,
            logs,
            state: ProcessState::Stopped,
            child: None,
            started_at: None,
        }
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(|c| c.pid())
    }

    pub fn started_at(&self) -> Option<DateTime<Local>> {
        self.started_at
    }

    /// Spawn `command` and start relaying its output. Returns the new PID.
    pub async fn launch(&mut self, command: &LaunchCommand) -> Result<u32, LaunchError> {
        if let Some(child) = &self.child {
            return Err(LaunchError::AlreadyRunning(child.pid()));
        }

        self.state = ProcessState::Starting;
        match self.adapter.spawn(command, &self.logs).await {
            Ok(child) => {
                let pid = child.pid();
                self.child = Some(child);
                self.started_at = Some(Local::now());
                self.state = ProcessState::Running;
                Ok(pid)
            }
            Err(e) => {
                self.state = ProcessState::Stopped;
                Err(e)
            }
        }
    }

    /// Check whether the child has exited, without waiting for it.
    ///
    /// On exit the remaining output is drained and the handle is cleared.
    pub async fn poll_exit(&mut self) -> ExitPoll {
        let Some(child) = self.child.as_mut() else {
            return ExitPoll::NotStarted;
        };
        match child.try_wait() {
            None => ExitPoll::Running,
            Some(exit) => {
                child.drain_output(env::relay_drain_timeout()).await;
                self.clear();
                ExitPoll::Exited(exit)
            }
        }
    }

    /// Terminate gracefully, killing the child if it outlives `grace`.
    ///
    /// The handle is `Stopped` on return whichever way the child ended.
    pub async fn request_stop(&mut self, grace: Duration) -> StopOutcome {
        let Some(mut child) = self.child.take() else {
            self.clear();
            return StopOutcome::AlreadyStopped;
        };

        let pid = child.pid();
        let outcome = match child.try_wait() {
            Some(exit) => StopOutcome::Graceful(exit),
            None => {
                self.state = ProcessState::Stopping;
                child.terminate().await;
                match tokio::time::timeout(grace, child.wait()).await {
                    Ok(exit) => StopOutcome::Graceful(exit),
                    Err(_) => {
                        tracing::warn!(
                            pid,
                            grace_secs = grace.as_secs(),
                            "process did not exit within grace period, killing"
                        );
                        StopOutcome::Forced(child.kill().await)
                    }
                }
            }
        };

        child.drain_output(env::relay_drain_timeout()).await;
        self.clear();
        outcome
    }

    fn clear(&mut self) {
        self.child = None;
        self.started_at = None;
        self.state = ProcessState::Stopped;
    }
}

#[cfg(test)]
#[path = "handle_tests.rs"]
mod tests;
