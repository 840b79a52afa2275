// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution helpers

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Default timeout for `kill` invocations.
pub const SIGNAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Run a subprocess command with a timeout.
///
/// Wraps `Command::output()` with `tokio::time::timeout`, converting
/// timeout expiration into a descriptive error message. The child process
/// is killed automatically if the timeout elapses (via the tokio `Child`
/// drop implementation).
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, String> {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(io_err)) => Err(format!("{} failed: {}", description, io_err)),
        Err(_elapsed) => Err(format!(
            "{} timed out after {}s",
            description,
            timeout.as_secs()
        )),
    }
}

/// Ask `pid` to exit with SIGTERM. Returns whether delivery succeeded.
pub async fn terminate(pid: u32) -> Result<bool, String> {
    let mut cmd = Command::new("kill");
    cmd.arg("-15").arg(pid.to_string());
    let output = run_with_timeout(cmd, SIGNAL_TIMEOUT, "kill").await?;
    Ok(output.status.success())
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
