// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::daemon_process::{
    force_kill, socket_responds, process_exists, spawn_daemon, wait_for_exit,
    wrap_with_startup_error, DaemonFiles,
};

use sk_daemon::protocol::{self, ProtocolError};
use sk_daemon::{
    BackupSummary, LogEntry, PathChanges, Request, Response, SettingsSummary, StatusSummary,
};
use thiserror::Error;
use tokio::net::UnixStream;

/// Timeout for quick IPC requests (ping, status, logs, settings)
pub fn timeout_ipc() -> Duration {
    crate::env::timeout_ipc_ms().unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for daemon to start
pub fn timeout_connect() -> Duration {
    crate::env::timeout_connect_ms().unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for the daemon process to exit.
///
/// The daemon stops the server before exiting, so this covers a full
/// graceful stop.
pub fn timeout_exit() -> Duration {
    crate::env::timeout_exit_ms().unwrap_or(Duration::from_secs(30))
}

/// Timeout for start, stop and restart, which wait for the server
pub fn timeout_action() -> Duration {
    crate::env::timeout_action_ms().unwrap_or(Duration::from_secs(60))
}

/// Timeout for backup and update, which run to completion
pub fn timeout_maintenance() -> Duration {
    crate::env::timeout_maintenance_ms().unwrap_or(Duration::from_secs(3600))
}

/// Polling interval for connection retries
pub fn poll_interval() -> Duration {
    crate::env::connect_poll_ms().unwrap_or(Duration::from_millis(50))
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running")]
    DaemonNotRunning,

    #[error("Failed to start daemon: {0}")]
    DaemonStartFailed(String),

    #[error("Connection timeout waiting for daemon to start")]
    DaemonStartTimeout,

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("{0}")]
    Rejected(String),

    #[error("Busy: {0}")]
    Busy(String),

    #[error("Unexpected response from daemon")]
    UnexpectedResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not determine state directory")]
    NoStateDir,
}

impl ClientError {
    /// The daemon is gone even though its socket file may remain.
    pub fn is_not_running(&self) -> bool {
        match self {
            ClientError::DaemonNotRunning => true,
            ClientError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionRefused | std::io::ErrorKind::NotFound
            ),
            _ => false,
        }
    }
}

/// Daemon client
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// For action commands: auto-start the daemon if needed.
    pub fn for_action() -> Result<Self, ClientError> {
        Self::connect_or_start()
    }

    /// For query commands: connect only, never start a daemon.
    pub fn for_query() -> Result<Self, ClientError> {
        Self::connect()
    }

    /// Connect to daemon, auto-starting if not running
    pub fn connect_or_start() -> Result<Self, ClientError> {
        match Self::connect() {
            Ok(client) => {
                // Daemon may have crashed, leaving a stale socket file
                if socket_responds(&client.socket_path) {
                    Ok(client)
                } else {
                    DaemonFiles::resolve()?.remove_stale();
                    let child = spawn_daemon()?;
                    Self::connect_with_retry(timeout_connect(), child)
                }
            }
            Err(ClientError::DaemonNotRunning) => {
                let child = spawn_daemon()?;
                Self::connect_with_retry(timeout_connect(), child)
            }
            Err(e) => Err(wrap_with_startup_error(e)),
        }
    }

    /// Connect to existing daemon (no auto-start)
    pub fn connect() -> Result<Self, ClientError> {
        let socket_path = DaemonFiles::resolve()?.socket;

        if !socket_path.exists() {
            let err = ClientError::DaemonNotRunning;
            log_connection_error(&err);
            return Err(err);
        }

        Ok(Self { socket_path })
    }

    fn connect_with_retry(
        timeout: Duration,
        mut child: std::process::Child,
    ) -> Result<Self, ClientError> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            // Early exit means startup failed; the log says why
            if let Ok(Some(status)) = child.try_wait() {
                let files = DaemonFiles::resolve()?;
                let poll_start = Instant::now();
                while poll_start.elapsed() < timeout_connect() {
                    if let Some(err) = files.startup_error() {
                        return Err(ClientError::DaemonStartFailed(err));
                    }
                    std::thread::sleep(poll_interval());
                }
                return Err(ClientError::DaemonStartFailed(format!(
                    "exited with {}",
                    status
                )));
            }

            match Self::connect() {
                Ok(client) if socket_responds(&client.socket_path) => return Ok(client),
                Ok(_) | Err(ClientError::DaemonNotRunning) => {
                    std::thread::sleep(poll_interval());
                }
                Err(e) => return Err(wrap_with_startup_error(e)),
            }
        }

        Err(wrap_with_startup_error(ClientError::DaemonStartTimeout))
    }

    /// Send a request and wait up to `timeout` for the response
    async fn send_with_timeout(
        &self,
        request: &Request,
        timeout: Duration,
    ) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();

        protocol::write_request(&mut writer, request, timeout_ipc()).await?;
        let response = protocol::read_response(&mut reader, timeout).await?;
        Ok(response)
    }

    /// Send a request and receive a response
    pub async fn send(&self, request: &Request, timeout: Duration) -> Result<Response, ClientError> {
        match self.send_with_timeout(request, timeout).await {
            Ok(response) => Ok(response),
            Err(e) => {
                log_connection_error(&e);
                Err(e)
            }
        }
    }

    /// Helper for requests answered with Ok
    async fn send_simple(&self, request: &Request) -> Result<(), ClientError> {
        match self.send(request, timeout_ipc()).await? {
            Response::Ok => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Helper for requests answered with a status summary
    async fn send_for_status(
        &self,
        request: &Request,
        timeout: Duration,
    ) -> Result<StatusSummary, ClientError> {
        match self.send(request, timeout).await? {
            Response::Status(status) => Ok(status),
            other => Err(unexpected(other)),
        }
    }

    pub async fn ping(&self) -> Result<(), ClientError> {
        match self.send(&Request::Ping, timeout_ipc()).await? {
            Response::Pong => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Get daemon version via Hello handshake
    pub async fn hello(&self) -> Result<String, ClientError> {
        let request = Request::Hello {
            version: env!("CARGO_PKG_VERSION").to_string(),
        };
        match self.send(&request, timeout_ipc()).await? {
            Response::Hello { version } => Ok(version),
            other => Err(unexpected(other)),
        }
    }

    pub async fn status(&self) -> Result<StatusSummary, ClientError> {
        self.send_for_status(&Request::Status, timeout_ipc()).await
    }

    pub async fn start(&self) -> Result<StatusSummary, ClientError> {
        self.send_for_status(&Request::Start, timeout_action()).await
    }

    pub async fn stop(&self) -> Result<StatusSummary, ClientError> {
        self.send_for_status(&Request::Stop, timeout_action()).await
    }

    pub async fn restart(&self) -> Result<StatusSummary, ClientError> {
        self.send_for_status(&Request::Restart, timeout_action()).await
    }

    /// Fetch log lines after `after`, or the last `limit` lines.
    pub async fn logs(
        &self,
        after: Option<u64>,
        limit: usize,
    ) -> Result<(Vec<LogEntry>, u64), ClientError> {
        match self
            .send(&Request::Logs { after, limit }, timeout_ipc())
            .await?
        {
            Response::Logs { lines, next } => Ok((lines, next)),
            other => Err(unexpected(other)),
        }
    }

    pub async fn backup(&self) -> Result<BackupSummary, ClientError> {
        match self.send(&Request::Backup, timeout_maintenance()).await? {
            Response::Backup(summary) => Ok(summary),
            other => Err(unexpected(other)),
        }
    }

    /// Run the updater; returns its exit code.
    pub async fn update(&self) -> Result<Option<i32>, ClientError> {
        match self.send(&Request::Update, timeout_maintenance()).await? {
            Response::Update { exit_code } => Ok(exit_code),
            other => Err(unexpected(other)),
        }
    }

    pub async fn set_schedule(&self, times: &[String]) -> Result<(), ClientError> {
        self.send_simple(&Request::SetSchedule {
            times: times.to_vec(),
        })
        .await
    }

    pub async fn set_args(&self, args: &[String]) -> Result<(), ClientError> {
        self.send_simple(&Request::SetArgs {
            args: args.to_vec(),
        })
        .await
    }

    async fn send_for_settings(&self, request: &Request) -> Result<SettingsSummary, ClientError> {
        match self.send(request, timeout_ipc()).await? {
            Response::Settings(summary) => Ok(summary),
            other => Err(unexpected(other)),
        }
    }

    /// Change maintenance paths; an empty change just reads them.
    pub async fn set_paths(&self, changes: PathChanges) -> Result<SettingsSummary, ClientError> {
        self.send_for_settings(&Request::SetPaths(changes)).await
    }

    pub async fn set_auto_start(&self, enabled: bool) -> Result<SettingsSummary, ClientError> {
        self.send_for_settings(&Request::SetAutoStart { enabled }).await
    }

    /// Request daemon shutdown
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        self.send_simple(&Request::Shutdown).await
    }
}

/// Map a response that doesn't answer the request to an error.
fn unexpected(response: Response) -> ClientError {
    match response {
        Response::Error { message } => ClientError::Rejected(message),
        Response::Busy { reason } => ClientError::Busy(reason),
        _ => ClientError::UnexpectedResponse,
    }
}

/// Stop the daemon (graceful first, then forceful)
/// Returns true if daemon was stopped, false if it wasn't running
pub async fn daemon_stop() -> Result<bool, ClientError> {
    let files = DaemonFiles::resolve()?;
    let client = match DaemonClient::connect() {
        Ok(c) => c,
        Err(ClientError::DaemonNotRunning) => {
            files.remove_stale();
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    let shutdown_result = client.shutdown().await;
    if let Err(ref e) = shutdown_result {
        if e.is_not_running() && files.read_pid().is_none() {
            files.remove_stale();
            return Ok(false);
        }
    }

    if let Some(pid) = files.read_pid() {
        if shutdown_result.is_ok() {
            wait_for_exit(pid, timeout_exit()).await;
        }

        if process_exists(pid) {
            force_kill(pid);
            wait_for_exit(pid, timeout_exit()).await;
        }
    }

    files.remove_stale();
    Ok(true)
}

/// Write a diagnostic message to `<state_dir>/cli.log`.
pub(crate) fn write_cli_log(message: String) {
    use std::io::Write;

    let Ok(DaemonFiles { dir, .. }) = DaemonFiles::resolve() else {
        return;
    };
    let log_path = dir.join("cli.log");
    let _ = std::fs::create_dir_all(&dir);

    if let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        let state_dir = crate::env::state_dir_raw().unwrap_or_else(|| "(not set)".to_string());

        let _ = writeln!(
            file,
            "[ts={}] pid={} SK_STATE_DIR={} {}",
            timestamp,
            std::process::id(),
            state_dir,
            message
        );
    }
}

/// Log a connection error for debugging.
pub fn log_connection_error(error: &ClientError) {
    let socket_path = DaemonFiles::resolve()
        .map(|files| files.socket.display().to_string())
        .unwrap_or_else(|_| "(unknown)".to_string());
    write_cli_log(format!("socket={} error={}", socket_path, error));
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
