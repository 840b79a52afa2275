// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maintenance action runners.
//!
//! Each runner acquires the [`MaintenanceGate`] synchronously, so a busy
//! gate is reported to the caller immediately, then runs the action on its
//! own task. The gate token moves into that task and is released when the
//! task finishes, fails, panics or is aborted.

use crate::error::MaintenanceError;
use crate::gate::{GateError, MaintenanceGate, MaintenanceKind};
use sk_adapters::{
    create_backup, run_update, ArchiveReport, ArchiveRequest, ProcessAdapter, UpdateRequest,
};
use sk_core::{Clock, ControlFlags, LogChannel, LogSource, ProcessExit};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Start a backup of the save files.
pub fn start_backup<C: Clock>(
    gate: &MaintenanceGate,
    clock: &C,
    request: ArchiveRequest,
    logs: LogChannel,
) -> Result<JoinHandle<Result<ArchiveReport, MaintenanceError>>, GateError> {
    let token = gate.try_acquire(MaintenanceKind::Backup)?;
    let now = clock.local_now();
    tracing::info!(save_dir = %request.save_dir.display(), "starting backup");
    logs.emit(LogSource::Supervisor, "Creating backup...");

    Ok(tokio::spawn(async move {
        let _token = token;
        let task_logs = logs.clone();
        let result =
            tokio::task::spawn_blocking(move || create_backup(&request, &task_logs, now)).await;

        match result {
            Ok(Ok(report)) => {
                logs.emit(
                    LogSource::Supervisor,
                    format!("Backup created: {}", report.path.display()),
                );
                Ok(report)
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "backup failed");
                logs.emit(LogSource::Supervisor, format!("Backup failed: {}", e));
                Err(e.into())
            }
            Err(e) => Err(MaintenanceError::Aborted(e.to_string())),
        }
    }))
}

/// Start the external updater.
///
/// The updater is stopped if shutdown is requested while it runs, with
/// `grace` before it is killed.
pub fn start_update<A: ProcessAdapter>(
    gate: &MaintenanceGate,
    adapter: A,
    request: UpdateRequest,
    logs: LogChannel,
    flags: ControlFlags,
    grace: Duration,
) -> Result<JoinHandle<Result<ProcessExit, MaintenanceError>>, GateError> {
    let token = gate.try_acquire(MaintenanceKind::Update)?;
    tracing::info!(updater = %request.executable.display(), "starting update");

    Ok(tokio::spawn(async move {
        let _token = token;
        run_update(&adapter, &request, &logs, &flags, grace).await.map_err(|e| {
            tracing::error!(error = %e, "update failed");
            MaintenanceError::from(e)
        })
    }))
}

#[cfg(test)]
#[path = "maintenance_tests.rs"]
mod tests;
