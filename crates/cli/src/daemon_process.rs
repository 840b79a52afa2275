// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Locating, launching and signalling the skd process.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use crate::client::ClientError;

/// First line skd appends to its log on every launch.
pub(crate) const STARTUP_MARKER_PREFIX: &str = "--- skd: starting (pid: ";

/// Files skd keeps in the state directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonFiles {
    pub dir: PathBuf,
    pub socket: PathBuf,
    pub pid: PathBuf,
    pub log: PathBuf,
}

impl DaemonFiles {
    pub fn resolve() -> Result<Self, ClientError> {
        Ok(Self::in_dir(crate::env::state_dir()?))
    }

    pub fn in_dir(dir: PathBuf) -> Self {
        Self {
            socket: dir.join("daemon.sock"),
            pid: dir.join("daemon.pid"),
            log: dir.join("logs").join("server.log"),
            dir,
        }
    }

    /// PID recorded by the daemon; unreadable or garbled files count as absent.
    pub fn read_pid(&self) -> Option<u32> {
        std::fs::read_to_string(&self.pid)
            .ok()
            .and_then(|content| content.trim().parse().ok())
    }

    /// True when the PID file names a process that still exists.
    pub fn owner_alive(&self) -> bool {
        self.read_pid().is_some_and(process_exists)
    }

    /// Remove the socket and PID file left by a daemon that is gone.
    ///
    /// Nothing is removed while the recorded process is alive.
    pub fn remove_stale(&self) {
        if self.owner_alive() {
            return;
        }
        for path in [&self.socket, &self.pid] {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    crate::client::write_cli_log(format!(
                        "failed to remove {}: {}",
                        path.display(),
                        e
                    ));
                }
            }
        }
    }

    /// Error the most recent launch wrote to the log, if any.
    pub fn startup_error(&self) -> Option<String> {
        let content = std::fs::read_to_string(&self.log).ok()?;
        parse_startup_error(&content)
    }
}

/// Spawn skd detached from this terminal.
pub fn spawn_daemon() -> Result<Child, ClientError> {
    let binary = find_skd_binary();
    Command::new(&binary)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| launch_failed(&binary, e))
}

/// Run skd attached to this terminal until it exits.
pub fn run_daemon_foreground() -> Result<ExitStatus, ClientError> {
    let binary = find_skd_binary();
    Command::new(&binary)
        .status()
        .map_err(|e| launch_failed(&binary, e))
}

fn launch_failed(binary: &Path, e: std::io::Error) -> ClientError {
    ClientError::DaemonStartFailed(format!("{}: {}", binary.display(), e))
}

/// Poll until `pid` is gone. Returns false on timeout.
pub async fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if !process_exists(pid) {
            return true;
        }
        tokio::time::sleep(crate::client::poll_interval()).await;
    }
    !process_exists(pid)
}

/// Locate skd: explicit override, then a dev build next to the sources,
/// then a sibling of this executable, then `$PATH`.
pub(crate) fn find_skd_binary() -> PathBuf {
    if let Some(path) = crate::env::daemon_binary() {
        return PathBuf::from(path);
    }

    let current_exe = std::env::current_exe().ok();
    let dev_build = current_exe
        .as_deref()
        .and_then(Path::to_str)
        .is_some_and(|s| s.contains("target/debug"));

    // CARGO_MANIFEST_DIR is crates/cli; the workspace root is two levels up
    let dev_candidate = dev_build
        .then(crate::env::cargo_manifest_dir)
        .flatten()
        .and_then(|dir| PathBuf::from(dir).ancestors().nth(2).map(Path::to_path_buf))
        .map(|root| root.join("target/debug/skd"));
    let sibling = current_exe
        .as_deref()
        .and_then(Path::parent)
        .map(|dir| dir.join("skd"));

    [dev_candidate, sibling]
        .into_iter()
        .flatten()
        .find(|path| path.exists())
        .unwrap_or_else(|| PathBuf::from("skd"))
}

/// Signals sent through `kill(1)`.
#[derive(Debug, Clone, Copy)]
enum Signal {
    /// Existence check only
    Check,
    Kill,
}

impl Signal {
    fn flag(self) -> &'static str {
        match self {
            Signal::Check => "-0",
            Signal::Kill => "-9",
        }
    }

    fn send(self, pid: u32) -> bool {
        Command::new("kill")
            .args([self.flag(), &pid.to_string()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|s| s.success())
    }
}

pub fn process_exists(pid: u32) -> bool {
    Signal::Check.send(pid)
}

pub fn force_kill(pid: u32) -> bool {
    Signal::Kill.send(pid)
}

/// Errors written since the last startup marker.
///
/// skd writes `ERROR Failed to start daemon: <reason>` synchronously when
/// startup fails; tracing lines carry ` ERROR ` after the timestamp. Only the
/// text after the first `": "` is kept.
pub(crate) fn parse_startup_error(content: &str) -> Option<String> {
    let attempt = &content[content.rfind(STARTUP_MARKER_PREFIX)?..];

    let mut errors = attempt
        .lines()
        .filter(|line| line.starts_with("ERROR ") || line.contains(" ERROR "))
        .map(|line| line.split_once(": ").map_or(line, |(_, msg)| msg))
        .peekable();
    errors.peek()?;
    Some(errors.collect::<Vec<_>>().join("\n"))
}

/// Prefer the reason from the daemon log over a generic connect failure.
pub fn wrap_with_startup_error(err: ClientError) -> ClientError {
    if matches!(err, ClientError::DaemonStartFailed(_)) {
        return err;
    }
    DaemonFiles::resolve()
        .ok()
        .and_then(|files| files.startup_error())
        .map_or(err, ClientError::DaemonStartFailed)
}

/// Whether a Unix socket accepts connections.
pub fn socket_responds(socket_path: &Path) -> bool {
    std::os::unix::net::UnixStream::connect(socket_path).is_ok()
}

#[cfg(test)]
#[path = "daemon_process_tests.rs"]
mod tests;
