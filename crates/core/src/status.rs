// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor status snapshot published to controllers.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a supervised process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessExit {
    /// Exit code, absent when the process was terminated by a signal.
    pub code: Option<i32>,
    /// Terminating signal number, if any.
    pub signal: Option<i32>,
}

impl ProcessExit {
    pub fn code(code: i32) -> Self {
        Self {
            code: Some(code),
            signal: None,
        }
    }

    pub fn signaled(signal: i32) -> Self {
        Self {
            code: None,
            signal: Some(signal),
        }
    }

    /// Exit status could not be determined.
    pub fn unknown() -> Self {
        Self {
            code: None,
            signal: None,
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for ProcessExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "exit code {}", code),
            (None, Some(signal)) => write!(f, "signal {}", signal),
            (None, None) => f.write_str("unknown status"),
        }
    }
}

/// Supervisor loop phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupervisorPhase {
    /// Not asked to run.
    #[default]
    Idle,
    /// Asked to run, but a maintenance action holds the gate.
    WaitingForMaintenance,
    /// Owns the supervised process (including restarts and crash cooldown).
    Active,
    /// Stopped after a launch failure; needs operator intervention.
    Halted,
    /// Loop exited after shutdown.
    Stopped,
}

impl fmt::Display for SupervisorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SupervisorPhase::Idle => "idle",
            SupervisorPhase::WaitingForMaintenance => "waiting for maintenance",
            SupervisorPhase::Active => "active",
            SupervisorPhase::Halted => "halted",
            SupervisorPhase::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorStatus {
    pub phase: SupervisorPhase,
    /// Whether the supervised process is alive right now.
    pub running: bool,
    pub pid: Option<u32>,
    pub started_at: Option<DateTime<Local>>,
    /// Completed manual and scheduled restarts.
    pub restarts: u32,
    /// Unexpected exits observed.
    pub crashes: u32,
    pub last_exit: Option<ProcessExit>,
    pub halt_reason: Option<String>,
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
