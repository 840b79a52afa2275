// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The daemon log file: rotation, startup markers and the tracing subscriber.
//!
//! Server output and daemon diagnostics share `logs/server.log`. Lines
//! written before tracing is installed (the startup marker and synchronous
//! startup errors) go straight to the file so `sk` can read them back when
//! a launch fails.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;

use crate::lifecycle::LifecycleError;

/// Rotated log files kept next to the live one (`server.log.1` ..)
pub(crate) const MAX_ROTATIONS: u32 = 3;

/// Size at which the log is rotated on startup
pub(crate) const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Full marker: `--- skd: starting (pid: 12345) ---`
pub const STARTUP_MARKER_PREFIX: &str = "--- skd: starting (pid: ";

pub struct DaemonLog {
    path: PathBuf,
}

impl DaemonLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn rotation(&self, n: u32) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{n}"));
        PathBuf::from(name)
    }

    /// Shift `server.log` to `server.log.1` once it has grown past
    /// [`MAX_LOG_SIZE`], dropping the oldest rotation.
    ///
    /// Failures are ignored; a missed rotation only means a larger log.
    pub fn rotate_if_needed(&self) {
        let too_big = std::fs::metadata(&self.path).is_ok_and(|m| m.len() > MAX_LOG_SIZE);
        if !too_big {
            return;
        }

        let _ = std::fs::remove_file(self.rotation(MAX_ROTATIONS));
        for n in (1..MAX_ROTATIONS).rev() {
            let from = self.rotation(n);
            if from.exists() {
                let _ = std::fs::rename(&from, self.rotation(n + 1));
            }
        }
        let _ = std::fs::rename(&self.path, self.rotation(1));
    }

    fn append_line(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)
    }

    /// Mark where this launch begins. Must precede [`DaemonLog::install`].
    pub fn write_startup_marker(&self) -> Result<(), LifecycleError> {
        self.append_line(&format!(
            "{}{}) ---",
            STARTUP_MARKER_PREFIX,
            std::process::id()
        ))?;
        Ok(())
    }

    /// Record a fatal startup error without going through the
    /// non-blocking writer, which may not flush before exit.
    pub fn write_startup_error(&self, error: &LifecycleError) {
        let _ = self.append_line(&format!("ERROR Failed to start daemon: {}", error));
    }

    /// Install the global subscriber: `RUST_LOG` filter (default `info`),
    /// plain-text lines appended to the log file.
    pub fn install(&self) -> Result<WorkerGuard, LifecycleError> {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let dir = self.path.parent().ok_or(LifecycleError::NoStateDir)?;
        let file_name = self.path.file_name().ok_or(LifecycleError::NoStateDir)?;
        std::fs::create_dir_all(dir)?;

        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_ansi(false).with_writer(writer))
            .init();

        Ok(guard)
    }
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
