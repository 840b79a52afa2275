// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded, sequence-numbered tail of recent log lines.
//!
//! Controllers that connect late (or poll) read from here using the last
//! sequence number they saw as a cursor.

use crate::log::LogLine;
use std::collections::VecDeque;

/// Default number of lines retained.
pub const DEFAULT_LOG_TAIL: usize = 5000;

/// Circular buffer of log lines with monotonically increasing sequence numbers.
#[derive(Debug)]
pub struct LogBuffer {
    lines: VecDeque<(u64, LogLine)>,
    max_lines: usize,
    next_seq: u64,
}

impl LogBuffer {
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(max_lines.min(DEFAULT_LOG_TAIL)),
            max_lines: max_lines.max(1),
            next_seq: 1,
        }
    }

    /// Append a line, evicting the oldest at capacity. Returns its sequence number.
    pub fn push(&mut self, line: LogLine) -> u64 {
        if self.lines.len() >= self.max_lines {
            self.lines.pop_front();
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.lines.push_back((seq, line));
        seq
    }

    /// Lines with sequence number greater than `after`, oldest first, at most `limit`.
    ///
    /// Returns the lines and the cursor to pass on the next call.
    pub fn since(&self, after: u64, limit: usize) -> (Vec<(u64, LogLine)>, u64) {
        let lines: Vec<_> = self
            .lines
            .iter()
            .filter(|(seq, _)| *seq > after)
            .take(limit)
            .cloned()
            .collect();
        let next = lines.last().map(|(seq, _)| *seq).unwrap_or(after);
        (lines, next)
    }

    /// The last `count` lines.
    pub fn tail(&self, count: usize) -> Vec<(u64, LogLine)> {
        let skip = self.lines.len().saturating_sub(count);
        self.lines.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sequence number of the newest line, or 0 when nothing was pushed yet.
    pub fn last_seq(&self) -> u64 {
        self.next_seq - 1
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_TAIL)
    }
}

#[cfg(test)]
#[path = "log_buffer_tests.rs"]
mod tests;
