// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sk-core: Core types for the serverkeep (sk) game server supervisor

pub mod clock;
pub mod control;
pub mod log;
pub mod log_buffer;
pub mod schedule;
pub mod status;
pub mod time_fmt;

pub use clock::{Clock, FakeClock, SystemClock};
pub use control::ControlFlags;
pub use log::{LogChannel, LogLine, LogSource};
pub use log_buffer::{LogBuffer, DEFAULT_LOG_TAIL};
pub use schedule::{
    parse_time_of_day, RestartSchedule, ScheduleCell, ScheduleError, TimeOfDay, SECONDS_PER_DAY,
};
pub use status::{ProcessExit, SupervisorPhase, SupervisorStatus};
pub use time_fmt::{format_countdown, format_uptime};
