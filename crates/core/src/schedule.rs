// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daily restart schedule.
//!
//! A [`RestartSchedule`] is a sorted, de-duplicated, non-empty set of
//! wall-clock times of day. Every lookup is a pure function of the schedule
//! and the time passed in.
//!
//! ```text
//!   00:00 ─────── 12:00 ─────────── 21:00 ─────── 24:00
//!                   ▲                  ▲
//!   now=11:59:30 ───┘ countdown 30s    │
//!   now=21:00:10 ───────────────────────── wraps to 12:00 next day
//! ```

use chrono::{NaiveTime, Timelike};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Seconds in one day.
pub const SECONDS_PER_DAY: u32 = 24 * 3600;

const MILLIS_PER_DAY: i64 = SECONDS_PER_DAY as i64 * 1000;

/// Errors from schedule construction or parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("restart schedule must contain at least one time")]
    Empty,

    #[error("invalid time '{0}': expected HH:MM with hours 0-23 and minutes 0-59")]
    InvalidTime(String),
}

/// A wall-clock time of day at minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Result<Self, ScheduleError> {
        if hour > 23 || minute > 59 {
            return Err(ScheduleError::InvalidTime(format!("{}:{:02}", hour, minute)));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Seconds elapsed since midnight at the start of this minute.
    pub fn seconds_from_midnight(&self) -> u32 {
        self.hour as u32 * 3600 + self.minute as u32 * 60
    }

    fn matches_minute(&self, now: NaiveTime) -> bool {
        now.hour() == self.hour as u32 && now.minute() == self.minute as u32
    }
}

/// Parse `H:MM` or `HH:MM`.
///
/// Hours take one or two digits, minutes exactly two.
pub fn parse_time_of_day(input: &str) -> Result<TimeOfDay, ScheduleError> {
    let invalid = || ScheduleError::InvalidTime(input.to_string());
    let (hours, minutes) = input.trim().split_once(':').ok_or_else(invalid)?;

    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !digits(hours) || hours.len() > 2 || !digits(minutes) || minutes.len() != 2 {
        return Err(invalid());
    }

    let hour: u8 = hours.parse().map_err(|_| invalid())?;
    let minute: u8 = minutes.parse().map_err(|_| invalid())?;
    TimeOfDay::new(hour, minute).map_err(|_| invalid())
}

impl FromStr for TimeOfDay {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_time_of_day(s)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ScheduleError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        parse_time_of_day(&s)
    }
}

impl From<TimeOfDay> for String {
    fn from(t: TimeOfDay) -> Self {
        t.to_string()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Ordered set of daily restart times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartSchedule {
    times: Vec<TimeOfDay>,
}

impl RestartSchedule {
    /// Build a schedule, sorting and de-duplicating the entries.
    pub fn new(mut times: Vec<TimeOfDay>) -> Result<Self, ScheduleError> {
        if times.is_empty() {
            return Err(ScheduleError::Empty);
        }
        times.sort();
        times.dedup();
        Ok(Self { times })
    }

    /// Parse a list of `HH:MM` strings into a schedule.
    pub fn parse<S: AsRef<str>>(times: &[S]) -> Result<Self, ScheduleError> {
        let parsed = times
            .iter()
            .map(|t| parse_time_of_day(t.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(parsed)
    }

    pub fn times(&self) -> &[TimeOfDay] {
        &self.times
    }

    /// The first scheduled time at or after `now`, wrapping to the first
    /// entry of the following day.
    pub fn next_restart(&self, now: NaiveTime) -> TimeOfDay {
        let now_secs = now.num_seconds_from_midnight();
        self.times
            .iter()
            .copied()
            .find(|t| now_secs <= t.seconds_from_midnight())
            .unwrap_or(self.times[0])
    }

    /// Seconds until the next scheduled restart, in `0..SECONDS_PER_DAY`.
    ///
    /// Zero exactly at a scheduled instant.
    pub fn seconds_until_next(&self, now: NaiveTime) -> u32 {
        let now_secs = now.num_seconds_from_midnight() as i64;
        let next_secs = self.next_restart(now).seconds_from_midnight() as i64;
        (next_secs - now_secs).rem_euclid(SECONDS_PER_DAY as i64) as u32
    }

    /// True when `now` is exactly a scheduled instant (`HH:MM:00`).
    pub fn is_restart_instant(&self, now: NaiveTime) -> bool {
        now.second() == 0 && self.times.iter().any(|t| t.matches_minute(now))
    }

    /// True when a scheduled instant falls in the window `(start, start + window]`.
    ///
    /// A window of one day or more always contains an instant.
    pub fn fires_within(&self, start: NaiveTime, window: Duration) -> bool {
        let window_ms = window.as_millis().min(i64::MAX as u128) as i64;
        if window_ms >= MILLIS_PER_DAY {
            return true;
        }
        let start_ms = start.num_seconds_from_midnight() as i64 * 1000
            + (start.nanosecond().min(999_999_999) / 1_000_000) as i64;

        self.times.iter().any(|t| {
            let at_ms = t.seconds_from_midnight() as i64 * 1000;
            let mut ahead = (at_ms - start_ms).rem_euclid(MILLIS_PER_DAY);
            if ahead == 0 {
                ahead = MILLIS_PER_DAY;
            }
            ahead <= window_ms
        })
    }
}

impl fmt::Display for RestartSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.times.iter().map(|t| t.to_string()).collect();
        write!(f, "{}", joined.join(", "))
    }
}

/// Shared, atomically replaceable schedule.
#[derive(Debug, Clone)]
pub struct ScheduleCell {
    inner: Arc<RwLock<RestartSchedule>>,
}

impl ScheduleCell {
    pub fn new(schedule: RestartSchedule) -> Self {
        Self {
            inner: Arc::new(RwLock::new(schedule)),
        }
    }

    /// Snapshot of the current schedule.
    pub fn get(&self) -> RestartSchedule {
        self.inner.read().clone()
    }

    pub fn replace(&self, schedule: RestartSchedule) {
        *self.inner.write() = schedule;
    }

    pub fn seconds_until_next(&self, now: NaiveTime) -> u32 {
        self.inner.read().seconds_until_next(now)
    }

    pub fn fires_within(&self, start: NaiveTime, window: Duration) -> bool {
        self.inner.read().fires_within(start, window)
    }
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
