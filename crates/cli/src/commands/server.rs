// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server control commands: start, stop, restart, status, logs,
//! backup, update and the settings commands.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::ValueEnum;
use sk_core::SupervisorPhase;
use sk_daemon::{LogEntry, PathChanges, SettingsSummary, StatusSummary};

use crate::client::{ClientError, DaemonClient};
use crate::daemon_process::DaemonFiles;
use crate::exit_error::{ExitError, EXIT_BUSY};
use crate::output::{
    format_backup, format_log_entry, format_settings, format_status, print_json, OutputFormat,
};

/// Lines fetched per request while following
const FOLLOW_PAGE: usize = 1000;

/// Convert a client error, giving busy refusals their own exit code.
fn client_error(e: ClientError) -> anyhow::Error {
    match e {
        ClientError::Busy(reason) => ExitError::new(EXIT_BUSY, format!("busy: {}", reason)).into(),
        e => anyhow!(e),
    }
}

fn print_not_running(format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("Daemon not running"),
        OutputFormat::Json => print_json(&serde_json::json!({ "status": "not_running" }))?,
    }
    Ok(())
}

/// Connect for a read-only command; `None` when no daemon is running.
fn query_client() -> Result<Option<DaemonClient>> {
    match DaemonClient::for_query() {
        Ok(client) => Ok(Some(client)),
        Err(e) if e.is_not_running() => Ok(None),
        Err(e) => Err(client_error(e)),
    }
}

fn action_client() -> Result<DaemonClient> {
    DaemonClient::for_action().map_err(client_error)
}

/// One-line summary after start/stop/restart.
pub(crate) fn describe_transition(status: &StatusSummary) -> String {
    match (status.running, status.pid, status.phase) {
        (true, Some(pid), _) => format!("Server running (pid {})", pid),
        (_, _, SupervisorPhase::WaitingForMaintenance) => match &status.maintenance {
            Some(kind) => format!("Server start deferred: {} in progress", kind),
            None => "Server start deferred".to_string(),
        },
        (false, _, SupervisorPhase::Active) => "Server starting".to_string(),
        (false, _, _) => match &status.last_exit {
            Some(exit) => format!("Server stopped ({})", exit),
            None => "Server stopped".to_string(),
        },
        (true, None, _) => "Server running".to_string(),
    }
}

fn print_transition(status: &StatusSummary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("{}", describe_transition(status)),
        OutputFormat::Json => print_json(status)?,
    }
    Ok(())
}

pub async fn start(format: OutputFormat) -> Result<()> {
    let client = action_client()?;
    let status = client.start().await.map_err(client_error)?;
    print_transition(&status, format)
}

pub async fn stop(format: OutputFormat) -> Result<()> {
    let Some(client) = query_client()? else {
        return print_not_running(format);
    };
    let status = match client.stop().await {
        Ok(status) => status,
        Err(e) if e.is_not_running() => return print_not_running(format),
        Err(e) => return Err(client_error(e)),
    };
    print_transition(&status, format)
}

pub async fn restart(format: OutputFormat) -> Result<()> {
    let client = action_client()?;
    let status = client.restart().await.map_err(client_error)?;
    print_transition(&status, format)
}

pub async fn status(format: OutputFormat) -> Result<()> {
    let Some(client) = query_client()? else {
        return print_not_running(format);
    };
    let status = match client.status().await {
        Ok(status) => status,
        Err(e) if e.is_not_running() => return print_not_running(format),
        Err(e) => return Err(client_error(e)),
    };

    match format {
        OutputFormat::Text => println!("{}", format_status(&status)),
        OutputFormat::Json => print_json(&status)?,
    }
    Ok(())
}

fn print_log_lines(lines: &[LogEntry], format: OutputFormat) -> Result<()> {
    for line in lines {
        match format {
            OutputFormat::Text => println!("{}", format_log_entry(line)),
            OutputFormat::Json => println!("{}", serde_json::to_string(line)?),
        }
    }
    Ok(())
}

pub async fn logs(limit: usize, follow: bool, format: OutputFormat) -> Result<()> {
    let Some(client) = query_client()? else {
        return logs_from_file(limit, format);
    };

    let (lines, next) = match client.logs(None, limit).await {
        Ok(page) => page,
        Err(e) if e.is_not_running() => return logs_from_file(limit, format),
        Err(e) => return Err(client_error(e)),
    };
    print_log_lines(&lines, format)?;

    if follow {
        follow_logs(&client, next, format).await?;
    }
    Ok(())
}

/// Poll the daemon for new lines until Ctrl+C or the daemon exits.
async fn follow_logs(client: &DaemonClient, mut next: u64, format: OutputFormat) -> Result<()> {
    let interval = crate::env::logs_poll_ms().unwrap_or(Duration::from_millis(500));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => return Ok(()),
            _ = tokio::time::sleep(interval) => {}
        }

        match client.logs(Some(next), FOLLOW_PAGE).await {
            Ok((lines, new_next)) => {
                print_log_lines(&lines, format)?;
                next = new_next;
            }
            Err(e) if e.is_not_running() => {
                eprintln!("Daemon stopped");
                return Ok(());
            }
            Err(e) => return Err(client_error(e)),
        }
    }
}

/// Without a daemon, fall back to the tail of the log file it left behind.
fn logs_from_file(limit: usize, format: OutputFormat) -> Result<()> {
    let log_path = DaemonFiles::resolve()?.log;
    let content = match std::fs::read_to_string(&log_path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            eprintln!("Daemon not running; no log file at {}", log_path.display());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let lines = last_lines(&content, limit);

    match format {
        OutputFormat::Text => {
            eprintln!("Daemon not running; showing {}", log_path.display());
            for line in lines {
                println!("{}", line);
            }
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "log_path": log_path.to_string_lossy(),
            "lines": lines,
        }))?,
    }
    Ok(())
}

pub(crate) fn last_lines(content: &str, n: usize) -> Vec<&str> {
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].to_vec()
}

pub async fn backup(format: OutputFormat) -> Result<()> {
    let client = action_client()?;
    let summary = client.backup().await.map_err(client_error)?;
    match format {
        OutputFormat::Text => println!("{}", format_backup(&summary)),
        OutputFormat::Json => print_json(&summary)?,
    }
    Ok(())
}

pub async fn update(format: OutputFormat) -> Result<()> {
    let client = action_client()?;
    let exit_code = client.update().await.map_err(client_error)?;
    match format {
        OutputFormat::Text => match exit_code {
            Some(code) => println!("Update finished (exit code {})", code),
            None => println!("Update finished"),
        },
        OutputFormat::Json => print_json(&serde_json::json!({ "exit_code": exit_code }))?,
    }
    Ok(())
}

pub async fn schedule(times: Vec<String>, format: OutputFormat) -> Result<()> {
    let client = action_client()?;
    client.set_schedule(&times).await.map_err(client_error)?;
    let status = client.status().await.map_err(client_error)?;

    match format {
        OutputFormat::Text => {
            println!("Restart schedule set to {}", status.schedule.join(", "));
            println!("Next restart: {}", status.next_restart);
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "schedule": status.schedule,
            "next_restart": status.next_restart,
        }))?,
    }
    Ok(())
}

pub async fn args(args: Vec<String>, format: OutputFormat) -> Result<()> {
    let client = action_client()?;
    client.set_args(&args).await.map_err(client_error)?;
    let status = client.status().await.map_err(client_error)?;

    match format {
        OutputFormat::Text => {
            println!("Server arguments set; applied at the next launch");
            println!("Command: {}", status.command);
        }
        OutputFormat::Json => print_json(&serde_json::json!({ "command": status.command }))?,
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

/// Resolve against the current directory; the daemon runs elsewhere.
pub(crate) fn absolute(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn print_settings(settings: &SettingsSummary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("{}", format_settings(settings)),
        OutputFormat::Json => print_json(settings)?,
    }
    Ok(())
}

pub async fn paths(changes: PathChanges, format: OutputFormat) -> Result<()> {
    let changes = PathChanges {
        save_dir: changes.save_dir.map(absolute).transpose()?,
        backup_dir: changes.backup_dir.map(absolute).transpose()?,
        updater_executable: changes.updater_executable.map(absolute).transpose()?,
        install_dir: changes.install_dir.map(absolute).transpose()?,
    };
    let client = action_client()?;
    let settings = client.set_paths(changes).await.map_err(client_error)?;
    print_settings(&settings, format)
}

pub async fn autostart(toggle: Toggle, format: OutputFormat) -> Result<()> {
    let client = action_client()?;
    let settings = client
        .set_auto_start(toggle == Toggle::On)
        .await
        .map_err(client_error)?;
    match format {
        OutputFormat::Text => println!(
            "Auto-start {}",
            if settings.auto_start { "enabled" } else { "disabled" }
        ),
        OutputFormat::Json => print_json(&settings)?,
    }
    Ok(())
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
