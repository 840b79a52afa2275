// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log channel carrying captured process output to observers.
//!
//! The channel is a broadcast over unbounded queues: every subscriber gets
//! every line, in send order, and a slow subscriber never blocks the sender.
//! The cost is unbounded memory growth if a subscriber stops draining while
//! still holding its receiver. Observers that only need a recent tail should
//! drain into a [`crate::LogBuffer`] instead of holding lines themselves.

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Where a log line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSource {
    Stdout,
    Stderr,
    /// Status messages produced by the supervisor itself.
    Supervisor,
}

/// One line of captured output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub source: LogSource,
    pub text: String,
    pub at: DateTime<Local>,
}

impl LogLine {
    pub fn new(source: LogSource, text: impl Into<String>) -> Self {
        Self {
            source,
            text: text.into(),
            at: Local::now(),
        }
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source {
            LogSource::Stderr => write!(f, "STDERR: {}", self.text),
            LogSource::Stdout | LogSource::Supervisor => f.write_str(&self.text),
        }
    }
}

/// Multi-observer, unbounded, FIFO log channel.
#[derive(Debug, Clone, Default)]
pub struct LogChannel {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<LogLine>>>>,
}

impl LogChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. It receives every line sent after this call.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<LogLine> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Deliver a line to every live observer, dropping closed ones.
    pub fn send(&self, line: LogLine) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(line.clone()).is_ok());
    }

    pub fn emit(&self, source: LogSource, text: impl Into<String>) {
        self.send(LogLine::new(source, text));
    }
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
