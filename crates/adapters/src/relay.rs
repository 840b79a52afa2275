// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output relay: forwards a child's stdout and stderr into the log channel.
//!
//! Both streams are read concurrently. Lines keep their order within a
//! stream; interleaving across the two streams is best effort. The relay
//! finishes once both streams reach end-of-file, which happens when the
//! child (and anything holding its pipes) has exited.

use sk_core::{LogChannel, LogSource};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;

/// Spawn a task relaying both streams into `logs`.
pub fn spawn_relay<O, E>(stdout: Option<O>, stderr: Option<E>, logs: LogChannel) -> JoinHandle<()>
where
    O: AsyncRead + Unpin + Send + 'static,
    E: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let out = async {
            if let Some(stream) = stdout {
                relay_stream(stream, LogSource::Stdout, &logs).await;
            }
        };
        let err = async {
            if let Some(stream) = stderr {
                relay_stream(stream, LogSource::Stderr, &logs).await;
            }
        };
        tokio::join!(out, err);
    })
}

/// Relay one stream line by line until EOF. Returns the number of lines sent.
pub async fn relay_stream<R>(reader: R, source: LogSource, logs: &LogChannel) -> usize
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut count = 0;
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf);
                logs.emit(source, text.trim_end());
                count += 1;
            }
            Err(e) => {
                tracing::debug!(?source, error = %e, "output stream read failed");
                break;
            }
        }
    }
    count
}

#[cfg(test)]
#[path = "relay_tests.rs"]
mod tests;
