// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! serverkeep daemon (skd)
//!
//! Background process that keeps the game server running.
//!
//! Architecture:
//! - Listener Task: handles controller connections on the Unix socket
//! - Supervisor Task: owns the server process, restarts it on schedule
//! - Main Task: waits for a shutdown signal, then drains the supervisor

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod env;
mod lifecycle;
mod listener;
mod logging;
mod protocol;
mod settings;

use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};

use crate::lifecycle::{Config, DaemonState, LifecycleError, StartupResult};
use crate::listener::Listener;
use crate::logging::DaemonLog;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const USAGE: &str = "\
serverkeep daemon - keeps a game server running and restarts it on schedule

USAGE:
    skd

The daemon is typically started by the `sk` CLI. It listens on a
Unix socket in the state directory for commands from `sk`.

ENVIRONMENT:
    SK_STATE_DIR     State directory (default: ~/.local/state/sk)
    SK_TICK_MS       Supervisor tick override in milliseconds
    RUST_LOG         Log filter (default: info)

OPTIONS:
    -h, --help       Print help information
    -v, --version    Print version information";

/// What the command line asks for.
#[derive(Debug, PartialEq, Eq)]
enum Invocation {
    Run,
    Version,
    Help,
    Unexpected(String),
}

impl Invocation {
    fn parse(mut args: impl Iterator<Item = String>) -> Self {
        match args.next() {
            None => Invocation::Run,
            Some(arg) => match arg.as_str() {
                "--version" | "-V" | "-v" => Invocation::Version,
                "--help" | "-h" | "help" => Invocation::Help,
                _ => Invocation::Unexpected(arg),
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Info flags are answered before touching the state directory
    match Invocation::parse(std::env::args().skip(1)) {
        Invocation::Run => {}
        Invocation::Version => {
            println!("skd {VERSION}");
            return Ok(());
        }
        Invocation::Help => {
            println!("skd {VERSION}");
            println!("{USAGE}");
            return Ok(());
        }
        Invocation::Unexpected(arg) => {
            eprintln!("error: unexpected argument '{arg}'");
            eprintln!("Usage: skd [--help | --version]");
            std::process::exit(1);
        }
    }

    let config = Config::load()?;
    let log = DaemonLog::new(&config.log_path);
    log.rotate_if_needed();
    log.write_startup_marker()?;
    let log_guard = log.install()?;

    info!(version = VERSION, "starting serverkeep daemon");

    let StartupResult {
        daemon,
        listener,
        supervisor,
    } = match lifecycle::startup(&config).await {
        Ok(result) => result,
        Err(LifecycleError::LockFailed(_)) => {
            report_already_running(&config);
            std::process::exit(1);
        }
        Err(e) => {
            log.write_startup_error(&e);
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    run(daemon, listener, supervisor).await?;
    Ok(())
}

/// Serve until a shutdown request or signal, then let the supervisor stop
/// the server and any update finish before the state files are removed.
async fn run(
    mut daemon: DaemonState,
    listener: tokio::net::UnixListener,
    supervisor: lifecycle::DaemonSupervisor,
) -> Result<(), LifecycleError> {
    let ctx = Arc::clone(&daemon.ctx);
    tokio::spawn(Listener::new(listener, Arc::clone(&ctx)).run());

    let supervisor_task = tokio::spawn(async move {
        match supervisor.run().await {
            Ok(()) => info!("supervisor stopped"),
            // The daemon keeps serving status and maintenance requests
            Err(e) => error!(reason = %e, "supervisor halted"),
        }
    });

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(socket = %daemon.config.socket_path.display(), "Daemon ready");
    println!("READY");

    tokio::select! {
        _ = ctx.shutdown.notified() => info!("shutdown requested by controller"),
        _ = sigterm.recv() => info!("received SIGTERM"),
        _ = sigint.recv() => info!("received SIGINT"),
    }

    // The supervisor and any running update both stop on this flag
    ctx.flags.request_shutdown();
    let limit = ctx.stop_timeout();
    let drained = async {
        let _ = supervisor_task.await;
        ctx.maintenance_finished().await;
    };
    if tokio::time::timeout(limit, drained).await.is_err() {
        warn!(
            timeout_ms = limit.as_millis() as u64,
            maintenance = ?ctx.gate.held_by(),
            "supervisor or maintenance did not finish in time"
        );
    }

    daemon.shutdown()?;
    info!("Daemon stopped");
    Ok(())
}

/// Tell the operator which daemon holds the lock.
fn report_already_running(config: &Config) {
    let read = |path: &std::path::Path| {
        std::fs::read_to_string(path)
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };
    let pid = read(&config.lock_path);
    let version = read(&config.version_path);

    eprintln!("skd is already running");
    if !pid.is_empty() {
        eprintln!("  pid: {pid}");
    }
    match version.as_str() {
        "" => {}
        v if v == VERSION => eprintln!("  version: {v}"),
        v => eprintln!("  version: {v} (outdated, current: {VERSION})"),
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod main_tests;
