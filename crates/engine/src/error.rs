// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the supervision engine

use sk_adapters::{ArchiveError, LaunchError, UpdateError};
use thiserror::Error;

/// Fatal supervisor errors. Recoverable conditions (crashes, stop
/// timeouts) are handled inside the loop and never surface here.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to launch server: {0}")]
    Launch(#[from] LaunchError),
}

/// Failure of a maintenance action after the gate was acquired.
#[derive(Debug, Error)]
pub enum MaintenanceError {
    #[error("backup failed: {0}")]
    Archive(#[from] ArchiveError),
    #[error("update failed: {0}")]
    Update(#[from] UpdateError),
    #[error("maintenance task aborted: {0}")]
    Aborted(String),
}
