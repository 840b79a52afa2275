// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! serverkeep supervision engine

mod error;
pub mod gate;
pub mod maintenance;
pub mod supervisor;

pub use error::{MaintenanceError, SupervisorError};
pub use gate::{BusyReason, GateError, MaintenanceGate, MaintenanceKind, MaintenanceToken};
pub use maintenance::{start_backup, start_update};
pub use supervisor::{CommandCell, Supervisor, SupervisorDeps, SupervisorTiming};
