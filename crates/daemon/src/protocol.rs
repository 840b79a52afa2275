// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol between `sk` and `skd`.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload

use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use sk_core::{LogLine, LogSource, ProcessExit, SupervisorPhase};
use sk_engine::MaintenanceKind;

#[path = "protocol_wire.rs"]
mod wire;
pub use wire::{
    decode, encode, read_frame, read_request, read_response, write_frame, write_request,
    write_response, ProtocolError, DEFAULT_TIMEOUT, MAX_MESSAGE_SIZE, PROTOCOL_VERSION,
};

/// Request from CLI to daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Version handshake
    Hello { version: String },

    /// Set desired-running and wait for the server to come up
    Start,

    /// Clear desired-running and wait for the server to stop
    Stop,

    /// Manual restart of a running server
    Restart,

    Status,

    /// Log lines after sequence number `after`, or the last `limit` lines
    /// when `after` is absent.
    Logs {
        #[serde(default)]
        after: Option<u64>,
        limit: usize,
    },

    /// Archive the save files (server must be stopped)
    Backup,

    /// Run the external updater (server must be stopped)
    Update,

    /// Replace the restart schedule
    SetSchedule { times: Vec<String> },

    /// Replace the server arguments; applied at the next launch
    SetArgs { args: Vec<String> },

    /// Change backup and update paths. Omitted fields keep their value;
    /// an empty change only reports the current settings.
    SetPaths(PathChanges),

    /// Persist whether the server starts together with the daemon
    SetAutoStart { enabled: bool },

    /// Stop the server and the daemon
    Shutdown,
}

/// Response from daemon to CLI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Response {
    Ok,

    Pong,

    Hello { version: String },

    Status(StatusSummary),

    Logs { lines: Vec<LogEntry>, next: u64 },

    Backup(BackupSummary),

    Update { exit_code: Option<i32> },

    Settings(SettingsSummary),

    /// Action refused by the maintenance gate
    Busy { reason: String },

    Error { message: String },
}

/// Supervisor state as seen by a controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusSummary {
    pub phase: SupervisorPhase,
    pub running: bool,
    /// Operator intent: whether the server should be running.
    pub desired_running: bool,
    pub pid: Option<u32>,
    /// Seconds since the current server process was launched
    pub uptime_secs: Option<u64>,
    pub restarts: u32,
    pub crashes: u32,
    pub last_exit: Option<ProcessExit>,
    pub halt_reason: Option<String>,
    /// Maintenance action currently holding the gate
    pub maintenance: Option<MaintenanceKind>,
    pub schedule: Vec<String>,
    pub next_restart: String,
    /// Seconds until `next_restart`
    pub countdown_secs: u64,
    /// Command line used at the next launch
    pub command: String,
    pub daemon_uptime_secs: u64,
}

/// Path changes requested by a controller.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updater_executable: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_dir: Option<PathBuf>,
}

impl PathChanges {
    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    /// Requested paths with their settings key.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &PathBuf)> {
        [
            ("save_dir", &self.save_dir),
            ("backup_dir", &self.backup_dir),
            ("updater_executable", &self.updater_executable),
            ("install_dir", &self.install_dir),
        ]
        .into_iter()
        .filter_map(|(key, path)| path.as_ref().map(|p| (key, p)))
    }
}

/// Maintenance paths and start-up behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettingsSummary {
    pub save_dir: PathBuf,
    pub save_files: Vec<String>,
    pub backup_dir: PathBuf,
    pub updater_executable: PathBuf,
    pub install_dir: PathBuf,
    pub auto_start: bool,
}

/// One buffered log line with its sequence number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogEntry {
    pub seq: u64,
    pub source: LogSource,
    pub text: String,
    pub at: DateTime<Local>,
}

impl LogEntry {
    pub fn new(seq: u64, line: LogLine) -> Self {
        Self {
            seq,
            source: line.source,
            text: line.text,
            at: line.at,
        }
    }

    /// Render the way the server log shows it (stderr lines marked).
    pub fn display_text(&self) -> String {
        match self.source {
            LogSource::Stderr => format!("STDERR: {}", self.text),
            LogSource::Stdout | LogSource::Supervisor => self.text.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackupSummary {
    pub path: PathBuf,
    pub files: Vec<String>,
    /// Compressed size in bytes
    pub size: u64,
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
