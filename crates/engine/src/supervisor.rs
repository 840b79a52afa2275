// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor loop: owns the supervised process and drives it from the
//! control flags, the restart schedule and observed exits.
//!
//! ```text
//!            desired_running && gate free
//!   Idle ───────────────────────────────────▶ Active ──┐ restart (manual|scheduled):
//!    ▲  ◀── stop request / shutdown ─────────   │  ▲   │   stop, relaunch now
//!    │                                          │  └───┘
//!    │                               unexpected │  ▲
//!    │                                     exit ▼  │ cooldown elapsed
//!    │                                      Cooldown
//!    │
//!    └── launch error ──▶ Halted (shutdown requested)
//! ```
//!
//! Each tick the schedule is asked whether a restart instant fell inside
//! the wall-clock window since the previous tick, so every instant fires at
//! most once no matter how the ticks land.

use crate::error::SupervisorError;
use crate::gate::MaintenanceGate;
use chrono::NaiveDateTime;
use parking_lot::RwLock;
use sk_adapters::{ExitPoll, LaunchCommand, ProcessAdapter, ProcessHandle, StopOutcome};
use sk_core::{
    Clock, ControlFlags, LogChannel, LogSource, ProcessExit, ScheduleCell, SupervisorPhase,
    SupervisorStatus,
};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Loop timing knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorTiming {
    pub tick: Duration,
    /// How long a graceful stop may take before the process is killed.
    pub grace_period: Duration,
    /// Pause before relaunching after an unexpected exit.
    pub crash_cooldown: Duration,
}

impl Default for SupervisorTiming {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            grace_period: Duration::from_secs(10),
            crash_cooldown: Duration::from_secs(5),
        }
    }
}

/// Shared launch command whose arguments may change while the supervisor runs.
///
/// Changes apply at the next launch.
#[derive(Debug, Clone)]
pub struct CommandCell {
    inner: Arc<RwLock<LaunchCommand>>,
}

impl CommandCell {
    pub fn new(command: LaunchCommand) -> Self {
        Self {
            inner: Arc::new(RwLock::new(command)),
        }
    }

    pub fn get(&self) -> LaunchCommand {
        self.inner.read().clone()
    }

    pub fn set_args(&self, args: Vec<String>) {
        self.inner.write().args = args;
    }
}

/// Shared state and adapters the supervisor runs against.
pub struct SupervisorDeps<A, C> {
    pub adapter: A,
    pub clock: C,
    pub flags: ControlFlags,
    pub schedule: ScheduleCell,
    pub gate: MaintenanceGate,
    pub logs: LogChannel,
    pub command: CommandCell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    ManualRestart,
    ScheduledRestart,
    StopRequested,
    Shutdown,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::ManualRestart => "manual restart",
            StopReason::ScheduledRestart => "scheduled restart",
            StopReason::StopRequested => "stop requested",
            StopReason::Shutdown => "shutdown",
        };
        f.write_str(s)
    }
}

pub struct Supervisor<A: ProcessAdapter, C: Clock> {
    handle: ProcessHandle<A>,
    clock: C,
    flags: ControlFlags,
    schedule: ScheduleCell,
    gate: MaintenanceGate,
    logs: LogChannel,
    command: CommandCell,
    timing: SupervisorTiming,
    status: watch::Sender<SupervisorStatus>,
    /// Wall-clock time of the previous schedule check.
    last_check: NaiveDateTime,
}

impl<A: ProcessAdapter, C: Clock> Supervisor<A, C> {
    pub fn new(deps: SupervisorDeps<A, C>, timing: SupervisorTiming) -> Self {
        let (status, _) = watch::channel(SupervisorStatus::default());
        let last_check = deps.clock.local_now();
        Self {
            handle: ProcessHandle::new(deps.adapter, deps.logs.clone()),
            clock: deps.clock,
            flags: deps.flags,
            schedule: deps.schedule,
            gate: deps.gate,
            logs: deps.logs,
            command: deps.command,
            timing,
            status,
            last_check,
        }
    }

    /// Receiver for status updates.
    pub fn subscribe(&self) -> watch::Receiver<SupervisorStatus> {
        self.status.subscribe()
    }

    /// Run until shutdown is requested or a launch fails.
    ///
    /// Any running process is stopped gracefully before returning.
    pub async fn run(mut self) -> Result<(), SupervisorError> {
        tracing::info!(tick_ms = self.timing.tick.as_millis() as u64, "supervisor started");
        let mut waiting_logged = false;

        while !self.flags.is_shutdown_requested() {
            if !self.flags.desired_running() {
                if self.flags.take_restart_request() {
                    tracing::debug!("restart requested while idle, ignoring");
                }
                waiting_logged = false;
                self.set_phase(SupervisorPhase::Idle);
                self.flags.wait_for_change(self.timing.tick).await;
                self.schedule_fired();
                continue;
            }

            if !self.gate.claim_process() {
                if !waiting_logged {
                    let kind = self.gate.held_by().map(|k| k.to_string()).unwrap_or_default();
                    tracing::info!(%kind, "start deferred until maintenance completes");
                    self.emit(format!("Start deferred: {} in progress", kind));
                    waiting_logged = true;
                }
                self.set_phase(SupervisorPhase::WaitingForMaintenance);
                self.flags.wait_for_change(self.timing.tick).await;
                self.schedule_fired();
                continue;
            }

            waiting_logged = false;
            if self.flags.take_restart_request() {
                tracing::debug!("restart request folded into start");
            }
            let result = self.run_active().await;
            self.gate.release_process();
            result?;
        }

        self.set_phase(SupervisorPhase::Stopped);
        tracing::info!("supervisor stopped");
        Ok(())
    }

    /// Own a live process until it should no longer run.
    async fn run_active(&mut self) -> Result<(), SupervisorError> {
        self.launch().await?;

        loop {
            if self.flags.is_shutdown_requested() {
                self.stop(StopReason::Shutdown).await;
                return Ok(());
            }
            if !self.flags.desired_running() {
                self.stop(StopReason::StopRequested).await;
                return Ok(());
            }

            // An exit seen in the same tick as a restart trigger is still a
            // crash: it gets the crash log line and the cooldown.
            if let ExitPoll::Exited(exit) = self.handle.poll_exit().await {
                self.record_crash(exit);
                if !self.crash_cooldown().await {
                    return Ok(());
                }
                self.launch().await?;
                continue;
            }

            // Both are consumed every tick so a coinciding manual request
            // and scheduled instant yield a single restart.
            let manual = self.flags.take_restart_request();
            let scheduled = self.schedule_fired();
            if manual || scheduled {
                let reason = if manual {
                    StopReason::ManualRestart
                } else {
                    StopReason::ScheduledRestart
                };
                self.stop(reason).await;
                if self.flags.is_shutdown_requested() || !self.flags.desired_running() {
                    return Ok(());
                }
                self.launch().await?;
                self.status.send_modify(|s| s.restarts += 1);
                continue;
            }

            self.flags.wait_for_change(self.timing.tick).await;
        }
    }

    async fn launch(&mut self) -> Result<(), SupervisorError> {
        let command = self.command.get();
        self.emit(format!("Starting server: {}", command));

        match self.handle.launch(&command).await {
            Ok(pid) => {
                self.last_check = self.clock.local_now();
                let started_at = self.handle.started_at();
                self.status.send_modify(|s| {
                    s.phase = SupervisorPhase::Active;
                    s.running = true;
                    s.pid = Some(pid);
                    s.started_at = started_at;
                });
                tracing::info!(pid, "server started");
                self.emit(format!("Server started (pid {})", pid));
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "launch failed, halting supervisor");
                self.emit(format!("Failed to start server: {}", e));
                self.flags.request_shutdown();
                let reason = e.to_string();
                self.status.send_modify(|s| {
                    s.phase = SupervisorPhase::Halted;
                    s.running = false;
                    s.pid = None;
                    s.started_at = None;
                    s.halt_reason = Some(reason);
                });
                Err(SupervisorError::Launch(e))
            }
        }
    }

    async fn stop(&mut self, reason: StopReason) {
        let pid = self.handle.pid();
        tracing::info!(?pid, %reason, "stopping server");
        self.emit(format!("Stopping server ({})...", reason));

        let exit = match self.handle.request_stop(self.timing.grace_period).await {
            StopOutcome::AlreadyStopped => None,
            StopOutcome::Graceful(exit) => {
                self.emit(format!("Server stopped with {}", exit));
                Some(exit)
            }
            StopOutcome::Forced(exit) => {
                tracing::warn!(?pid, "stop timed out, process killed");
                self.emit(format!(
                    "Server did not stop within {}s; killed",
                    self.timing.grace_period.as_secs()
                ));
                Some(exit)
            }
        };

        self.status.send_modify(|s| {
            s.running = false;
            s.pid = None;
            s.started_at = None;
            if exit.is_some() {
                s.last_exit = exit;
            }
        });
    }

    fn record_crash(&mut self, exit: ProcessExit) {
        tracing::warn!(%exit, "server exited unexpectedly");
        self.emit(format!(
            "Server exited unexpectedly with {}; restarting in {}s",
            exit,
            self.timing.crash_cooldown.as_secs()
        ));
        self.status.send_modify(|s| {
            s.running = false;
            s.pid = None;
            s.started_at = None;
            s.crashes += 1;
            s.last_exit = Some(exit);
        });
    }

    /// Wait out the crash cooldown.
    ///
    /// Returns `false` if shutdown or stop was requested meanwhile. A restart
    /// request ends the cooldown early.
    async fn crash_cooldown(&mut self) -> bool {
        let deadline = Instant::now() + self.timing.crash_cooldown;
        loop {
            if self.flags.is_shutdown_requested() || !self.flags.desired_running() {
                tracing::info!("relaunch cancelled during cooldown");
                return false;
            }
            if self.flags.take_restart_request() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            self.flags.wait_for_change(deadline - now).await;
        }
    }

    /// Whether a scheduled instant passed since the previous check.
    fn schedule_fired(&mut self) -> bool {
        let now = self.clock.local_now();
        let elapsed = (now - self.last_check).to_std().unwrap_or(Duration::ZERO);
        let fired = self.schedule.fires_within(self.last_check.time(), elapsed);
        self.last_check = now;
        fired
    }

    fn set_phase(&self, phase: SupervisorPhase) {
        self.status.send_if_modified(|s| {
            if s.phase == phase {
                return false;
            }
            s.phase = phase;
            true
        });
    }

    fn emit(&self, message: String) {
        self.logs.emit(LogSource::Supervisor, message);
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
