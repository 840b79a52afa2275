// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for wall-clock and monotonic time.
//!
//! The supervisor reads local wall-clock time to evaluate the restart
//! schedule. Tests substitute [`FakeClock`] to pin the time of day.

use chrono::{Local, NaiveDateTime};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of time for the supervisor.
pub trait Clock: Clone + Send + Sync + 'static {
    /// Monotonic instant, used for uptime measurement.
    fn now(&self) -> Instant;

    /// Local wall-clock date and time, used for schedule evaluation.
    fn local_now(&self) -> NaiveDateTime;
}

/// Clock backed by the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn local_now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[derive(Debug)]
struct FakeTime {
    instant: Instant,
    local: NaiveDateTime,
}

/// Manually driven clock.
///
/// Both the monotonic and the wall-clock reading move together on
/// [`FakeClock::advance`]; [`FakeClock::set_local`] jumps the wall clock only.
#[derive(Clone, Debug)]
pub struct FakeClock {
    inner: Arc<Mutex<FakeTime>>,
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeClock {
    /// Fake clock starting at the Unix epoch (00:00:00 local).
    pub fn new() -> Self {
        Self::at(NaiveDateTime::default())
    }

    /// Fake clock starting at the given local date and time.
    pub fn at(local: NaiveDateTime) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeTime {
                instant: Instant::now(),
                local,
            })),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut time = self.inner.lock();
        time.instant += by;
        time.local += chrono::Duration::from_std(by).unwrap_or(chrono::Duration::zero());
    }

    pub fn set_local(&self, local: NaiveDateTime) {
        self.inner.lock().local = local;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.inner.lock().instant
    }

    fn local_now(&self) -> NaiveDateTime {
        self.inner.lock().local
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
