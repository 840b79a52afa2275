// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OS process adapter backed by `tokio::process`.

use super::{ChildProcess, LaunchCommand, LaunchError, ProcessAdapter};
use crate::relay::spawn_relay;
use crate::subprocess;
use async_trait::async_trait;
use sk_core::{LogChannel, ProcessExit};
use std::os::unix::fs::PermissionsExt;
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

/// Spawns real OS processes.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsProcessAdapter;

impl OsProcessAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn check_executable(path: &Path) -> Result<(), LaunchError> {
    let metadata =
        std::fs::metadata(path).map_err(|_| LaunchError::NotFound(path.to_path_buf()))?;
    if !metadata.is_file() || metadata.permissions().mode() & 0o111 == 0 {
        return Err(LaunchError::NotExecutable(path.to_path_buf()));
    }
    Ok(())
}

#[async_trait]
impl ProcessAdapter for OsProcessAdapter {
    type Child = OsChild;

    async fn spawn(
        &self,
        command: &LaunchCommand,
        logs: &LogChannel,
    ) -> Result<OsChild, LaunchError> {
        let program = command.resolved_program();
        check_executable(&program)?;

        let mut cmd = Command::new(&program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|source| LaunchError::Spawn {
            path: program.clone(),
            source,
        })?;
        let pid = child.id().unwrap_or_default();
        let relay = spawn_relay(child.stdout.take(), child.stderr.take(), logs.clone());

        Ok(OsChild {
            child,
            pid,
            relay: Some(relay),
        })
    }
}

/// A live OS child with its output relay task.
#[derive(Debug)]
pub struct OsChild {
    child: Child,
    pid: u32,
    relay: Option<JoinHandle<()>>,
}

fn exit_from_status(status: ExitStatus) -> ProcessExit {
    match (status.code(), status.signal()) {
        (Some(code), _) => ProcessExit::code(code),
        (None, Some(signal)) => ProcessExit::signaled(signal),
        (None, None) => ProcessExit::unknown(),
    }
}

#[async_trait]
impl ChildProcess for OsChild {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn try_wait(&mut self) -> Option<ProcessExit> {
        match self.child.try_wait() {
            Ok(status) => status.map(exit_from_status),
            Err(e) => {
                tracing::warn!(pid = self.pid, error = %e, "failed to poll process status");
                Some(ProcessExit::unknown())
            }
        }
    }

    async fn terminate(&mut self) {
        if let Err(e) = subprocess::terminate(self.pid).await {
            tracing::warn!(pid = self.pid, error = %e, "failed to send SIGTERM");
        }
    }

    async fn wait(&mut self) -> ProcessExit {
        match self.child.wait().await {
            Ok(status) => exit_from_status(status),
            Err(e) => {
                tracing::warn!(pid = self.pid, error = %e, "failed to wait for process");
                ProcessExit::unknown()
            }
        }
    }

    async fn kill(&mut self) -> ProcessExit {
        if let Err(e) = self.child.kill().await {
            tracing::warn!(pid = self.pid, error = %e, "kill failed (may be expected)");
        }
        self.wait().await
    }

    async fn drain_output(&mut self, timeout: Duration) {
        let Some(mut relay) = self.relay.take() else {
            return;
        };
        if tokio::time::timeout(timeout, &mut relay).await.is_err() {
            tracing::warn!(pid = self.pid, "output relay still busy after exit, abandoning");
            relay.abort();
        }
    }
}

#[cfg(test)]
#[path = "os_tests.rs"]
mod tests;
