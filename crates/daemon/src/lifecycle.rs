// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shared context, shutdown.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use fs2::FileExt;
use parking_lot::Mutex;
use sk_adapters::{OsProcessAdapter, ProcessAdapter, TracedProcessAdapter};
use sk_core::{
    Clock, ControlFlags, LogBuffer, LogChannel, ScheduleCell, SupervisorStatus, SystemClock,
};
use sk_engine::{CommandCell, MaintenanceGate, Supervisor, SupervisorDeps, SupervisorTiming};
use thiserror::Error;
use tokio::net::UnixListener;
use tokio::sync::{watch, Notify};
use tracing::{info, warn};

use crate::env;
use crate::settings::{ConfigError, Settings};

const MAINTENANCE_POLL: Duration = Duration::from_millis(50);

/// Process adapter used by the daemon (wrapped with tracing)
pub type DaemonAdapter = TracedProcessAdapter<OsProcessAdapter>;

pub type DaemonSupervisor = Supervisor<DaemonAdapter, SystemClock>;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/sk)
    pub state_dir: PathBuf,
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    pub version_path: PathBuf,
    /// Daemon and server output log
    pub log_path: PathBuf,
    pub settings_path: PathBuf,
}

impl Config {
    /// Load configuration for the user-level daemon.
    pub fn load() -> Result<Self, LifecycleError> {
        Ok(Self::at(env::state_dir()?))
    }

    /// Configuration rooted at `state_dir`.
    pub fn at(state_dir: PathBuf) -> Self {
        Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            version_path: state_dir.join("daemon.version"),
            log_path: state_dir.join("logs").join("server.log"),
            settings_path: state_dir.join("settings.toml"),
            state_dir,
        }
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// State shared by the listener and the supervisor.
pub struct DaemonContext<A, C> {
    pub flags: ControlFlags,
    pub schedule: ScheduleCell,
    pub command: CommandCell,
    pub gate: MaintenanceGate,
    pub logs: LogChannel,
    pub log_buffer: Arc<Mutex<LogBuffer>>,
    pub status: watch::Receiver<SupervisorStatus>,
    pub settings: Mutex<Settings>,
    pub settings_path: PathBuf,
    /// Also used to run the updater.
    pub adapter: A,
    pub clock: C,
    pub timing: SupervisorTiming,
    pub start_time: Instant,
    pub shutdown: Arc<Notify>,
}

impl<A: ProcessAdapter, C: Clock> DaemonContext<A, C> {
    /// Wire a supervisor to shared state built from `settings`.
    ///
    /// The supervisor is returned unstarted; the caller spawns `run()`.
    pub fn build(
        settings: Settings,
        settings_path: PathBuf,
        adapter: A,
        clock: C,
        timing: SupervisorTiming,
    ) -> Result<(Arc<Self>, Supervisor<A, C>), ConfigError> {
        let schedule = ScheduleCell::new(settings.schedule()?);
        let command = CommandCell::new(settings.launch_command());
        let flags = ControlFlags::new();
        let gate = MaintenanceGate::new();
        let logs = LogChannel::new();

        let supervisor = Supervisor::new(
            SupervisorDeps {
                adapter: adapter.clone(),
                clock: clock.clone(),
                flags: flags.clone(),
                schedule: schedule.clone(),
                gate: gate.clone(),
                logs: logs.clone(),
                command: command.clone(),
            },
            timing,
        );

        let ctx = Arc::new(Self {
            flags,
            schedule,
            command,
            gate,
            logs,
            log_buffer: Arc::new(Mutex::new(LogBuffer::default())),
            status: supervisor.subscribe(),
            settings: Mutex::new(settings),
            settings_path,
            adapter,
            clock,
            timing,
            start_time: Instant::now(),
            shutdown: Arc::new(Notify::new()),
        });
        Ok((ctx, supervisor))
    }
}

impl<A, C> DaemonContext<A, C> {
    /// Copy every log line into the buffer and the daemon log.
    pub fn spawn_log_collector(&self) {
        let mut rx = self.logs.subscribe();
        let buffer = Arc::clone(&self.log_buffer);
        tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                tracing::info!(target: "server", source = ?line.source, "{}", line);
                buffer.lock().push(line);
            }
        });
    }

    /// Persist a settings change. Failures are logged and returned.
    pub fn update_settings(&self, change: impl FnOnce(&mut Settings)) -> Result<(), ConfigError> {
        let mut settings = self.settings.lock();
        change(&mut settings);
        settings.save(&self.settings_path).inspect_err(|e| {
            warn!(error = %e, "failed to save settings");
        })
    }

    /// Resolve once no maintenance action holds the gate.
    pub async fn maintenance_finished(&self) {
        while self.gate.held_by().is_some() {
            tokio::time::sleep(self.timing.tick.min(MAINTENANCE_POLL)).await;
        }
    }

    /// Upper bound for the supervisor's final graceful stop.
    pub fn stop_timeout(&self) -> Duration {
        self.timing.grace_period + self.timing.tick * 2 + Duration::from_secs(1)
    }
}

/// Daemon state during operation.
pub struct DaemonState {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub ctx: Arc<DaemonContext<DaemonAdapter, SystemClock>>,
}

impl DaemonState {
    /// Remove the socket, PID and version files.
    ///
    /// The supervisor must already have stopped the server.
    pub fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        for path in [
            &self.config.socket_path,
            &self.config.lock_path,
            &self.config.version_path,
        ] {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!(path = %path.display(), "Failed to remove file: {}", e);
                }
            }
        }

        // Lock file is released automatically when self.lock_file is dropped
        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Result of daemon startup.
pub struct StartupResult {
    pub daemon: DaemonState,
    /// The Unix socket listener to spawn as a task
    pub listener: UnixListener,
    /// Supervisor to spawn; not yet running
    pub supervisor: DaemonSupervisor,
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // Nothing to clean up after a lock failure:
            // those files belong to the already-running daemon.
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

async fn startup_inner(config: &Config) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    // Open without truncating so a running daemon's PID survives until we hold the lock
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    use std::io::Write;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    std::fs::write(&config.version_path, env!("CARGO_PKG_VERSION"))?;

    let settings = Settings::load_or_default(&config.settings_path);
    let timing = settings.timing(env::tick_override());
    let auto_start = settings.auto_start;
    info!(
        schedule = %settings.restart_times.join(", "),
        executable = %settings.executable.display(),
        tick_ms = timing.tick.as_millis() as u64,
        "settings applied"
    );

    let adapter = TracedProcessAdapter::new(OsProcessAdapter::new());
    let (ctx, supervisor) = DaemonContext::build(
        settings,
        config.settings_path.clone(),
        adapter,
        SystemClock,
        timing,
    )?;
    ctx.spawn_log_collector();

    if auto_start {
        info!("auto_start enabled, starting server");
        ctx.flags.set_desired_running(true);
    }

    // Remove stale socket and bind (LAST - only after all validation passes)
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    Ok(StartupResult {
        daemon: DaemonState {
            config: config.clone(),
            lock_file,
            ctx,
        },
        listener,
        supervisor,
    })
}

/// Remove files created by a failed startup.
fn cleanup_on_failure(config: &Config) {
    for path in [
        &config.socket_path,
        &config.version_path,
        &config.lock_path,
    ] {
        if path.exists() {
            if let Err(e) = std::fs::remove_file(path) {
                warn!(path = %path.display(), "Failed to clean up after startup failure: {}", e);
            }
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
