// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server control and settings requests.
//!
//! Start, stop and restart only change the control flags; the supervisor
//! does the work. The handlers then wait (bounded) on the status watch so
//! the response reflects the outcome.

use std::time::Duration;

use chrono::Local;
use sk_core::{Clock, LogSource, RestartSchedule, SupervisorPhase, SupervisorStatus};

use crate::lifecycle::DaemonContext;
use crate::protocol::{LogEntry, PathChanges, Response, StatusSummary};
use crate::settings::check_paths;

/// Upper bound on lines returned by one `Logs` request.
pub(super) const MAX_LOG_PAGE: usize = 1000;

/// Wait until `done` holds for the published status, or `timeout` elapses.
///
/// Returns the matching status, or the latest one on timeout.
async fn wait_for_status<A, C>(
    ctx: &DaemonContext<A, C>,
    timeout: Duration,
    done: impl FnMut(&SupervisorStatus) -> bool,
) -> SupervisorStatus {
    let mut rx = ctx.status.clone();
    let reached = tokio::time::timeout(timeout, rx.wait_for(done))
        .await
        .map(|r| r.map(|status| status.clone()));
    match reached {
        Ok(Ok(status)) => status,
        _ => rx.borrow().clone(),
    }
}

/// Error response when the supervisor can no longer act on commands.
fn unavailable(status: &SupervisorStatus) -> Option<Response> {
    match status.phase {
        SupervisorPhase::Halted => Some(halted(status)),
        SupervisorPhase::Stopped => Some(Response::Error {
            message: "daemon is shutting down".to_string(),
        }),
        _ => None,
    }
}

fn halted(status: &SupervisorStatus) -> Response {
    Response::Error {
        message: format!(
            "supervisor halted: {}; fix the settings and restart the daemon",
            status.halt_reason.as_deref().unwrap_or("launch failed")
        ),
    }
}

pub(super) fn summarize<A, C: Clock>(
    ctx: &DaemonContext<A, C>,
    status: &SupervisorStatus,
) -> StatusSummary {
    let schedule = ctx.schedule.get();
    let now = ctx.clock.local_now().time();
    StatusSummary {
        phase: status.phase,
        running: status.running,
        desired_running: ctx.flags.desired_running(),
        pid: status.pid,
        uptime_secs: status
            .started_at
            .map(|at| (Local::now() - at).num_seconds().max(0) as u64),
        restarts: status.restarts,
        crashes: status.crashes,
        last_exit: status.last_exit,
        halt_reason: status.halt_reason.clone(),
        maintenance: ctx.gate.held_by(),
        schedule: schedule.times().iter().map(|t| t.to_string()).collect(),
        next_restart: schedule.next_restart(now).to_string(),
        countdown_secs: u64::from(schedule.seconds_until_next(now)),
        command: ctx.command.get().to_string(),
        daemon_uptime_secs: ctx.start_time.elapsed().as_secs(),
    }
}

pub(super) async fn handle_start<A, C: Clock>(ctx: &DaemonContext<A, C>) -> Response {
    let current = ctx.status.borrow().clone();
    if let Some(response) = unavailable(&current) {
        return response;
    }

    ctx.flags.set_desired_running(true);
    let timeout = ctx.stop_timeout() + ctx.timing.crash_cooldown;
    let status = wait_for_status(ctx, timeout, |s| {
        s.running
            || matches!(
                s.phase,
                SupervisorPhase::WaitingForMaintenance
                    | SupervisorPhase::Halted
                    | SupervisorPhase::Stopped
            )
    })
    .await;

    match status.phase {
        SupervisorPhase::Halted => halted(&status),
        _ => Response::Status(summarize(ctx, &status)),
    }
}

pub(super) async fn handle_stop<A, C: Clock>(ctx: &DaemonContext<A, C>) -> Response {
    ctx.flags.set_desired_running(false);
    let status = wait_for_status(ctx, ctx.stop_timeout(), |s| {
        !s.running
            && !matches!(
                s.phase,
                SupervisorPhase::Active | SupervisorPhase::WaitingForMaintenance
            )
    })
    .await;
    Response::Status(summarize(ctx, &status))
}

pub(super) async fn handle_restart<A, C: Clock>(ctx: &DaemonContext<A, C>) -> Response {
    let current = ctx.status.borrow().clone();
    if let Some(response) = unavailable(&current) {
        return response;
    }
    if current.phase != SupervisorPhase::Active {
        return Response::Error {
            message: "server is not running".to_string(),
        };
    }

    ctx.flags.request_restart();
    let timeout = ctx.stop_timeout() + ctx.timing.tick;
    let status = wait_for_status(ctx, timeout, |s| {
        s.restarts > current.restarts
            || (s.running && s.pid != current.pid)
            || s.phase != SupervisorPhase::Active
    })
    .await;

    match status.phase {
        SupervisorPhase::Halted => halted(&status),
        _ => Response::Status(summarize(ctx, &status)),
    }
}

pub(super) fn handle_status<A, C: Clock>(ctx: &DaemonContext<A, C>) -> Response {
    let status = ctx.status.borrow().clone();
    Response::Status(summarize(ctx, &status))
}

pub(super) fn handle_logs<A, C>(
    ctx: &DaemonContext<A, C>,
    after: Option<u64>,
    limit: usize,
) -> Response {
    let limit = limit.min(MAX_LOG_PAGE);
    let buffer = ctx.log_buffer.lock();
    let (lines, next) = match after {
        Some(after) => buffer.since(after, limit),
        None => (buffer.tail(limit), buffer.last_seq()),
    };
    Response::Logs {
        lines: lines
            .into_iter()
            .map(|(seq, line)| LogEntry::new(seq, line))
            .collect(),
        next,
    }
}

pub(super) fn handle_set_schedule<A, C>(ctx: &DaemonContext<A, C>, times: Vec<String>) -> Response {
    let schedule = match RestartSchedule::parse(&times) {
        Ok(schedule) => schedule,
        Err(e) => {
            return Response::Error {
                message: e.to_string(),
            }
        }
    };

    tracing::info!(%schedule, "restart schedule updated");
    ctx.schedule.replace(schedule.clone());
    ctx.logs.emit(
        LogSource::Supervisor,
        format!("Restart schedule set to {}", schedule),
    );

    match ctx.update_settings(|s| s.set_schedule(&schedule)) {
        Ok(()) => Response::Ok,
        Err(e) => Response::Error {
            message: format!("schedule applied but not saved: {}", e),
        },
    }
}

pub(super) fn handle_set_args<A, C>(ctx: &DaemonContext<A, C>, args: Vec<String>) -> Response {
    tracing::info!(?args, "server arguments updated");
    ctx.command.set_args(args.clone());
    ctx.logs.emit(
        LogSource::Supervisor,
        format!("Server arguments set to: {}", args.join(" ")),
    );

    match ctx.update_settings(|s| s.args = args) {
        Ok(()) => Response::Ok,
        Err(e) => Response::Error {
            message: format!("arguments applied but not saved: {}", e),
        },
    }
}

pub(super) fn handle_set_paths<A, C>(ctx: &DaemonContext<A, C>, changes: PathChanges) -> Response {
    if changes.is_empty() {
        return Response::Settings(ctx.settings.lock().summary());
    }
    if let Err(e) = check_paths(&changes) {
        return Response::Error {
            message: e.to_string(),
        };
    }

    for (field, path) in changes.entries() {
        tracing::info!(field, path = %path.display(), "path updated");
        ctx.logs.emit(
            LogSource::Supervisor,
            format!("Path {} set to {}", field, path.display()),
        );
    }

    match ctx.update_settings(|s| s.apply_paths(&changes)) {
        Ok(()) => Response::Settings(ctx.settings.lock().summary()),
        Err(e) => Response::Error {
            message: format!("paths applied but not saved: {}", e),
        },
    }
}

pub(super) fn handle_set_auto_start<A, C>(ctx: &DaemonContext<A, C>, enabled: bool) -> Response {
    tracing::info!(enabled, "auto-start updated");
    let state = if enabled { "enabled" } else { "disabled" };
    ctx.logs.emit(LogSource::Supervisor, format!("Auto-start {}", state));

    match ctx.update_settings(|s| s.auto_start = enabled) {
        Ok(()) => Response::Settings(ctx.settings.lock().summary()),
        Err(e) => Response::Error {
            message: format!("auto-start applied but not saved: {}", e),
        },
    }
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
