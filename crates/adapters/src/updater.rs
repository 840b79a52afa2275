// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External updater invocation (SteamCMD-style command line).

use crate::env;
use crate::process::{ChildProcess, LaunchCommand, LaunchError, ProcessAdapter};
use sk_core::{ControlFlags, LogChannel, LogSource, ProcessExit};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("updater not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to launch updater: {0}")]
    Launch(LaunchError),

    #[error("updater failed with {0}")]
    Failed(ProcessExit),

    #[error("update interrupted by shutdown ({0})")]
    Interrupted(ProcessExit),
}

impl From<LaunchError> for UpdateError {
    fn from(e: LaunchError) -> Self {
        match e {
            LaunchError::NotFound(path) => UpdateError::NotFound(path),
            other => UpdateError::Launch(other),
        }
    }
}

/// Updater executable and the install it should update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    pub executable: PathBuf,
    pub install_dir: PathBuf,
    pub app_id: String,
}

impl UpdateRequest {
    pub fn args(&self) -> Vec<String> {
        vec![
            "+force_install_dir".to_string(),
            self.install_dir.display().to_string(),
            "+login".to_string(),
            "anonymous".to_string(),
            "+app_update".to_string(),
            self.app_id.clone(),
            "+quit".to_string(),
        ]
    }

    pub fn command(&self) -> LaunchCommand {
        LaunchCommand::new(&self.executable, self.args())
    }
}

/// Run the updater to completion, relaying its output into `logs`.
///
/// A non-zero exit is reported as [`UpdateError::Failed`]. A shutdown
/// request stops the updater: SIGTERM, then SIGKILL once `grace` elapses.
pub async fn run_update<A: ProcessAdapter>(
    adapter: &A,
    request: &UpdateRequest,
    logs: &LogChannel,
    flags: &ControlFlags,
    grace: Duration,
) -> Result<ProcessExit, UpdateError> {
    logs.emit(LogSource::Supervisor, "Starting update...");
    let mut child = adapter.spawn(&request.command(), logs).await?;
    let pid = child.pid();

    let (exit, interrupted) = tokio::select! {
        exit = child.wait() => (exit, false),
        _ = flags.wait_for_shutdown() => {
            tracing::info!(pid, "shutdown requested, stopping updater");
            logs.emit(LogSource::Supervisor, "Shutdown requested; stopping update");
            child.terminate().await;
            let exit = match tokio::time::timeout(grace, child.wait()).await {
                Ok(exit) => exit,
                Err(_) => {
                    tracing::warn!(pid, "updater ignored SIGTERM, killing");
                    child.kill().await
                }
            };
            (exit, true)
        }
    };
    child.drain_output(env::relay_drain_timeout()).await;

    tracing::info!(pid, %exit, interrupted, "updater finished");
    if interrupted {
        logs.emit(LogSource::Supervisor, format!("Update stopped with {}", exit));
        Err(UpdateError::Interrupted(exit))
    } else if exit.success() {
        logs.emit(LogSource::Supervisor, "Update complete");
        Ok(exit)
    } else {
        logs.emit(LogSource::Supervisor, format!("Update failed with {}", exit));
        Err(UpdateError::Failed(exit))
    }
}

#[cfg(test)]
#[path = "updater_tests.rs"]
mod tests;
