// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! Each connection carries one request and one response and is handled on
//! its own task, so a long maintenance action never blocks other
//! controllers.

mod control;
mod maintenance;
#[cfg(test)]
mod test_helpers;

use std::sync::Arc;

use sk_adapters::ProcessAdapter;
use sk_core::Clock;
use thiserror::Error;
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, warn};

use crate::env;
use crate::lifecycle::DaemonContext;
use crate::protocol::{self, Request, Response, PROTOCOL_VERSION};

/// Listener task for accepting socket connections.
pub struct Listener<A, C> {
    socket: UnixListener,
    ctx: Arc<DaemonContext<A, C>>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),
}

impl<A: ProcessAdapter, C: Clock> Listener<A, C> {
    pub fn new(socket: UnixListener, ctx: Arc<DaemonContext<A, C>>) -> Self {
        Self { socket, ctx }
    }

    /// Run the accept loop, spawning a task per connection.
    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &ctx).await {
                            match e {
                                ConnectionError::Protocol(
                                    protocol::ProtocolError::ConnectionClosed,
                                ) => debug!("Client disconnected"),
                                ConnectionError::Protocol(protocol::ProtocolError::Timeout) => {
                                    warn!("Connection timeout")
                                }
                                _ => error!("Connection error: {}", e),
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

async fn handle_connection<A: ProcessAdapter, C: Clock>(
    stream: UnixStream,
    ctx: &DaemonContext<A, C>,
) -> Result<(), ConnectionError> {
    let timeout = env::ipc_timeout();
    let (mut reader, mut writer) = stream.into_split();

    let request = protocol::read_request(&mut reader, timeout).await?;

    // Polling requests at debug level, commands at info
    if matches!(
        request,
        Request::Ping | Request::Status | Request::Logs { .. }
    ) {
        debug!(request = ?request, "received request");
    } else {
        tracing::info!(request = ?request, "received request");
    }

    let response = handle_request(request, ctx).await;
    debug!("Sending response: {:?}", response);

    protocol::write_response(&mut writer, &response, timeout).await?;
    Ok(())
}

/// Handle a single request and return a response.
pub(crate) async fn handle_request<A: ProcessAdapter, C: Clock>(
    request: Request,
    ctx: &DaemonContext<A, C>,
) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version: _ } => Response::Hello {
            version: PROTOCOL_VERSION.to_string(),
        },

        Request::Start => control::handle_start(ctx).await,

        Request::Stop => control::handle_stop(ctx).await,

        Request::Restart => control::handle_restart(ctx).await,

        Request::Status => control::handle_status(ctx),

        Request::Logs { after, limit } => control::handle_logs(ctx, after, limit),

        Request::SetSchedule { times } => control::handle_set_schedule(ctx, times),

        Request::SetArgs { args } => control::handle_set_args(ctx, args),

        Request::SetPaths(changes) => control::handle_set_paths(ctx, changes),

        Request::SetAutoStart { enabled } => control::handle_set_auto_start(ctx, enabled),

        Request::Backup => maintenance::handle_backup(ctx).await,

        Request::Update => maintenance::handle_update(ctx).await,

        Request::Shutdown => {
            ctx.shutdown.notify_one();
            Response::Ok
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
