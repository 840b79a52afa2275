// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sk daemon` - Daemon management commands

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use crate::client::{daemon_stop, DaemonClient};
use crate::daemon_process::run_daemon_foreground;
use crate::output::{print_json, OutputFormat};

#[derive(Args)]
pub struct DaemonArgs {
    /// Print the running daemon's version
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    #[command(subcommand)]
    pub command: Option<DaemonCommand>,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon in the background
    Start,
    /// Stop the server and the daemon
    Stop,
    /// Run the daemon in the foreground (useful for debugging)
    Run,
}

pub async fn daemon(args: DaemonArgs, format: OutputFormat) -> Result<()> {
    if args.version {
        return version(format).await;
    }

    match args.command {
        Some(DaemonCommand::Start) => start(format).await,
        Some(DaemonCommand::Stop) => stop(format).await,
        Some(DaemonCommand::Run) => run(),
        None => {
            let mut cmd = crate::cli_command();
            if let Some(sub) = cmd.find_subcommand_mut("daemon") {
                sub.print_help()?;
            }
            Ok(())
        }
    }
}

async fn version(format: OutputFormat) -> Result<()> {
    let version = match DaemonClient::connect() {
        Ok(client) => match client.hello().await {
            Ok(v) => Some(v),
            Err(e) if e.is_not_running() => None,
            Err(_) => Some("unknown".to_string()),
        },
        Err(_) => None,
    };

    match (version, format) {
        (Some(v), OutputFormat::Text) => println!("skd {}", v),
        (Some(v), OutputFormat::Json) => print_json(&serde_json::json!({ "version": v }))?,
        (None, OutputFormat::Text) => println!("Daemon not running"),
        (None, OutputFormat::Json) => print_json(&serde_json::json!({ "status": "not_running" }))?,
    }
    Ok(())
}

async fn start(format: OutputFormat) -> Result<()> {
    if let Ok(client) = DaemonClient::connect() {
        if let Ok(status) = client.status().await {
            match format {
                OutputFormat::Text => println!(
                    "Daemon already running (uptime: {})",
                    sk_core::format_uptime(status.daemon_uptime_secs)
                ),
                OutputFormat::Json => print_json(&serde_json::json!({
                    "status": "running",
                    "uptime_secs": status.daemon_uptime_secs,
                }))?,
            }
            return Ok(());
        }
    }

    let client = DaemonClient::connect_or_start().map_err(|e| anyhow!("{}", e))?;
    client.ping().await.map_err(|e| anyhow!("{}", e))?;
    match format {
        OutputFormat::Text => println!("Daemon started"),
        OutputFormat::Json => print_json(&serde_json::json!({ "status": "started" }))?,
    }
    Ok(())
}

async fn stop(format: OutputFormat) -> Result<()> {
    let stopped = daemon_stop()
        .await
        .map_err(|e| anyhow!("Failed to stop daemon: {}", e))?;

    match format {
        OutputFormat::Text if stopped => println!("Daemon stopped"),
        OutputFormat::Text => println!("Daemon not running"),
        OutputFormat::Json => print_json(&serde_json::json!({ "stopped": stopped }))?,
    }
    Ok(())
}

fn run() -> Result<()> {
    let status = run_daemon_foreground().map_err(|e| anyhow!("{}", e))?;
    if !status.success() {
        return Err(anyhow!("Daemon exited with status: {}", status));
    }
    Ok(())
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
