// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervised process adapters

mod handle;
mod os;

pub use handle::ProcessHandle;
pub use os::{OsChild, OsProcessAdapter};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeChild, FakeProcessAdapter, ProcessCall};

use async_trait::async_trait;
use sk_core::{LogChannel, ProcessExit};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Executable, arguments and working directory of a process to launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl LaunchCommand {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: None,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Program path, with relative paths resolved against the working directory.
    pub fn resolved_program(&self) -> PathBuf {
        match &self.working_dir {
            Some(dir) if self.program.is_relative() => dir.join(&self.program),
            _ => self.program.clone(),
        }
    }
}

impl fmt::Display for LaunchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Errors from launching a process
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("executable not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("not an executable file: {}", .0.display())]
    NotExecutable(PathBuf),

    #[error("failed to spawn {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("process already running (pid {0})")]
    AlreadyRunning(u32),
}

/// Lifecycle state of a [`ProcessHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

/// Result of a non-blocking liveness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitPoll {
    /// No process has been launched (or it was already reaped).
    NotStarted,
    Running,
    Exited(ProcessExit),
}

/// How [`ProcessHandle::request_stop`] ended the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    AlreadyStopped,
    /// Exited on its own within the grace period (or had already exited).
    Graceful(ProcessExit),
    /// Killed after the grace period elapsed.
    Forced(ProcessExit),
}

/// Spawns supervised processes.
#[async_trait]
pub trait ProcessAdapter: Clone + Send + Sync + 'static {
    type Child: ChildProcess;

    /// Spawn `command`, relaying its output into `logs`.
    async fn spawn(
        &self,
        command: &LaunchCommand,
        logs: &LogChannel,
    ) -> Result<Self::Child, LaunchError>;
}

/// One live child process.
#[async_trait]
pub trait ChildProcess: Send + 'static {
    fn pid(&self) -> u32;

    /// Exit status if the process has exited, without blocking.
    fn try_wait(&mut self) -> Option<ProcessExit>;

    /// Ask the process to exit (SIGTERM).
    async fn terminate(&mut self);

    /// Wait for the process to exit. Cancel safe.
    async fn wait(&mut self) -> ProcessExit;

    /// Force-kill the process and reap it.
    async fn kill(&mut self) -> ProcessExit;

    /// Wait up to `timeout` for the output relay to finish after exit.
    async fn drain_output(&mut self, _timeout: Duration) {}
}
