// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maintenance gate: mutual exclusion between the supervised process and
//! maintenance actions (backup, update).
//!
//! One mutex guards both sides. The supervisor claims the process side
//! before launching and keeps it for its whole active phase, including
//! crash cooldown. A maintenance action holds a [`MaintenanceToken`] for its
//! whole run; dropping the token releases the gate on every exit path.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Which maintenance action holds the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaintenanceKind {
    Backup,
    Update,
}

impl fmt::Display for MaintenanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaintenanceKind::Backup => f.write_str("backup"),
            MaintenanceKind::Update => f.write_str("update"),
        }
    }
}

/// Why the gate refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyReason {
    ServerRunning,
    MaintenanceRunning(MaintenanceKind),
}

impl fmt::Display for BusyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusyReason::ServerRunning => f.write_str("server is running; stop it first"),
            BusyReason::MaintenanceRunning(kind) => write!(f, "{} already in progress", kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("busy: {reason}")]
    Busy { reason: BusyReason },
}

#[derive(Debug, Default)]
struct GateState {
    held_by: Option<MaintenanceKind>,
    process_active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MaintenanceGate {
    state: Arc<Mutex<GateState>>,
}

impl MaintenanceGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the gate for a maintenance action.
    ///
    /// Fails with [`GateError::Busy`] while the supervised process is active
    /// or another action holds the gate.
    pub fn try_acquire(&self, kind: MaintenanceKind) -> Result<MaintenanceToken, GateError> {
        let mut state = self.state.lock();
        if state.process_active {
            return Err(GateError::Busy {
                reason: BusyReason::ServerRunning,
            });
        }
        if let Some(held) = state.held_by {
            return Err(GateError::Busy {
                reason: BusyReason::MaintenanceRunning(held),
            });
        }
        state.held_by = Some(kind);
        tracing::debug!(%kind, "maintenance gate acquired");
        Ok(MaintenanceToken {
            gate: self.clone(),
            kind,
        })
    }

    /// The action currently holding the gate, if any.
    pub fn held_by(&self) -> Option<MaintenanceKind> {
        self.state.lock().held_by
    }

    /// Mark the supervised process as active. Returns `false` while a
    /// maintenance action holds the gate.
    pub fn claim_process(&self) -> bool {
        let mut state = self.state.lock();
        if state.held_by.is_some() {
            return false;
        }
        state.process_active = true;
        true
    }

    pub fn release_process(&self) {
        self.state.lock().process_active = false;
    }

    pub fn is_process_active(&self) -> bool {
        self.state.lock().process_active
    }

    fn release(&self, kind: MaintenanceKind) {
        let mut state = self.state.lock();
        if state.held_by == Some(kind) {
            state.held_by = None;
        }
        tracing::debug!(%kind, "maintenance gate released");
    }
}

/// Scoped ownership of the gate. Releases on drop.
#[derive(Debug)]
pub struct MaintenanceToken {
    gate: MaintenanceGate,
    kind: MaintenanceKind,
}

impl MaintenanceToken {
    pub fn kind(&self) -> MaintenanceKind {
        self.kind
    }
}

impl Drop for MaintenanceToken {
    fn drop(&mut self) {
        self.gate.release(self.kind);
    }
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
