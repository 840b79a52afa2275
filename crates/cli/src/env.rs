// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::client::ClientError;

// --- Duration helper (private) ---

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

// --- State directory ---

/// Resolve state directory: SK_STATE_DIR > XDG_STATE_HOME/sk > ~/.local/state/sk
pub fn state_dir() -> Result<PathBuf, ClientError> {
    if let Ok(dir) = std::env::var("SK_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("sk"));
    }
    let home = std::env::var("HOME").map_err(|_| ClientError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/sk"))
}

/// Read SK_STATE_DIR raw (for diagnostic logging)
pub fn state_dir_raw() -> Option<String> {
    std::env::var("SK_STATE_DIR").ok()
}

// --- Daemon binary ---

pub fn daemon_binary() -> Option<String> {
    std::env::var("SK_DAEMON_BINARY").ok()
}

pub fn cargo_manifest_dir() -> Option<String> {
    std::env::var("CARGO_MANIFEST_DIR").ok()
}

// --- Timeouts ---

pub fn timeout_ipc_ms() -> Option<Duration> {
    parse_duration_ms("SK_TIMEOUT_IPC_MS")
}
pub fn timeout_connect_ms() -> Option<Duration> {
    parse_duration_ms("SK_TIMEOUT_CONNECT_MS")
}
pub fn timeout_exit_ms() -> Option<Duration> {
    parse_duration_ms("SK_TIMEOUT_EXIT_MS")
}
pub fn timeout_action_ms() -> Option<Duration> {
    parse_duration_ms("SK_TIMEOUT_ACTION_MS")
}
pub fn timeout_maintenance_ms() -> Option<Duration> {
    parse_duration_ms("SK_TIMEOUT_MAINTENANCE_MS")
}
pub fn connect_poll_ms() -> Option<Duration> {
    parse_duration_ms("SK_CONNECT_POLL_MS")
}
pub fn logs_poll_ms() -> Option<Duration> {
    parse_duration_ms("SK_LOGS_POLL_MS")
}
