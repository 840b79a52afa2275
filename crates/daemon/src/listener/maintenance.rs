// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backup and update requests.
//!
//! The gate is checked before anything runs, so a busy gate answers
//! immediately. Otherwise the response is sent when the action finishes.

use sk_adapters::ProcessAdapter;
use sk_core::Clock;
use sk_engine::{start_backup, start_update, GateError};

use crate::lifecycle::DaemonContext;
use crate::protocol::{BackupSummary, Response};

fn busy(error: GateError) -> Response {
    let GateError::Busy { reason } = error;
    Response::Busy {
        reason: reason.to_string(),
    }
}

pub(super) async fn handle_backup<A, C: Clock>(ctx: &DaemonContext<A, C>) -> Response {
    let request = ctx.settings.lock().archive_request();
    let task = match start_backup(&ctx.gate, &ctx.clock, request, ctx.logs.clone()) {
        Ok(task) => task,
        Err(e) => return busy(e),
    };

    match task.await {
        Ok(Ok(report)) => Response::Backup(BackupSummary {
            path: report.path,
            files: report.files,
            size: report.size,
        }),
        Ok(Err(e)) => Response::Error {
            message: e.to_string(),
        },
        Err(e) => Response::Error {
            message: format!("backup task failed: {}", e),
        },
    }
}

pub(super) async fn handle_update<A: ProcessAdapter, C>(ctx: &DaemonContext<A, C>) -> Response {
    let request = ctx.settings.lock().update_request();
    let task = match start_update(
        &ctx.gate,
        ctx.adapter.clone(),
        request,
        ctx.logs.clone(),
        ctx.flags.clone(),
        ctx.timing.grace_period,
    ) {
        Ok(task) => task,
        Err(e) => return busy(e),
    };

    match task.await {
        Ok(Ok(exit)) => Response::Update {
            exit_code: exit.code,
        },
        Ok(Err(e)) => Response::Error {
            message: e.to_string(),
        },
        Err(e) => Response::Error {
            message: format!("update task failed: {}", e),
        },
    }
}

#[cfg(test)]
#[path = "maintenance_tests.rs"]
mod tests;
