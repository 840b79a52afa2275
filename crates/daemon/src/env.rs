// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Resolve state directory: SK_STATE_DIR > XDG_STATE_HOME/sk > ~/.local/state/sk
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("SK_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("sk"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/sk"))
}

/// Supervisor tick override (SK_TICK_MS), taking precedence over settings.
pub fn tick_override() -> Option<Duration> {
    parse_duration_ms("SK_TICK_MS").filter(|d| !d.is_zero())
}

/// Timeout for reading a request and writing its response (SK_TIMEOUT_IPC_MS).
pub fn ipc_timeout() -> Duration {
    parse_duration_ms("SK_TIMEOUT_IPC_MS").unwrap_or(crate::protocol::DEFAULT_TIMEOUT)
}
