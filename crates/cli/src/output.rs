// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;
use serde::Serialize;
use sk_core::{format_countdown, format_uptime, SupervisorPhase};
use sk_daemon::{BackupSummary, LogEntry, SettingsSummary, StatusSummary};

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print `value` as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Render the status report shown by `sk status`.
pub fn format_status(status: &StatusSummary) -> String {
    let mut out = Vec::new();

    let state = match (status.running, status.pid) {
        (true, Some(pid)) => format!("running (pid {})", pid),
        (true, None) => "running".to_string(),
        (false, _) => "stopped".to_string(),
    };
    out.push(format!("Server:       {}", state));
    out.push(format!("Supervisor:   {}", status.phase));
    if let Some(uptime) = status.uptime_secs {
        out.push(format!("Uptime:       {}", format_uptime(uptime)));
    }
    if let Some(kind) = &status.maintenance {
        out.push(format!("Maintenance:  {} in progress", kind));
    }
    if status.phase == SupervisorPhase::Halted {
        if let Some(reason) = &status.halt_reason {
            out.push(format!("Halted:       {}", reason));
        }
    }
    out.push(format!(
        "Next restart: {} (in {})",
        status.next_restart,
        format_countdown(status.countdown_secs)
    ));
    out.push(format!("Schedule:     {}", status.schedule.join(", ")));
    out.push(format!(
        "Restarts:     {}  Crashes: {}",
        status.restarts, status.crashes
    ));
    if let Some(exit) = &status.last_exit {
        out.push(format!("Last exit:    {}", exit));
    }
    out.push(format!("Command:      {}", status.command));

    out.join("\n")
}

/// One log line as `sk logs` prints it.
pub fn format_log_entry(entry: &LogEntry) -> String {
    format!("[{}] {}", entry.at.format("%H:%M:%S"), entry.display_text())
}

/// Byte count with a binary unit: `"512 B"`, `"1.5 KiB"`, `"2.0 MiB"`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Render the result of a backup.
pub fn format_backup(summary: &BackupSummary) -> String {
    format!(
        "Backup written: {} ({}, {} file(s): {})",
        summary.path.display(),
        format_size(summary.size),
        summary.files.len(),
        summary.files.join(", ")
    )
}

pub fn format_settings(settings: &SettingsSummary) -> String {
    [
        format!("Save dir:     {}", settings.save_dir.display()),
        format!("Save files:   {}", settings.save_files.join(", ")),
        format!("Backup dir:   {}", settings.backup_dir.display()),
        format!("Updater:      {}", settings.updater_executable.display()),
        format!("Install dir:  {}", settings.install_dir.display()),
        format!(
            "Auto-start:   {}",
            if settings.auto_start { "on" } else { "off" }
        ),
    ]
    .join("\n")
}
