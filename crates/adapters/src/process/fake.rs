// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake process adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ChildProcess, LaunchCommand, LaunchError, ProcessAdapter};
use async_trait::async_trait;
use parking_lot::Mutex;
use sk_core::{LogChannel, LogSource, ProcessExit};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Notify;

const SIGTERM: i32 = 15;
const SIGKILL: i32 = 9;

/// Recorded process call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessCall {
    Spawn { command: LaunchCommand, pid: u32 },
    Terminate { pid: u32 },
    Kill { pid: u32 },
}

#[derive(Debug, Default)]
struct FakeProcess {
    exit: Option<ProcessExit>,
}

struct FakeProcessState {
    processes: HashMap<u32, FakeProcess>,
    calls: Vec<ProcessCall>,
    next_pid: u32,
    fail_next_spawn: Option<LaunchError>,
    ignore_terminate: bool,
    output: Vec<String>,
}

/// Fake process adapter for testing
///
/// Children never exit on their own; use [`FakeProcessAdapter::crash`] to
/// simulate an external kill. PIDs start at 1000.
#[derive(Clone)]
pub struct FakeProcessAdapter {
    inner: Arc<Mutex<FakeProcessState>>,
    exited: Arc<Notify>,
}

impl Default for FakeProcessAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeProcessState {
                processes: HashMap::new(),
                calls: Vec::new(),
                next_pid: 1000,
                fail_next_spawn: None,
                ignore_terminate: false,
                output: Vec::new(),
            })),
            exited: Arc::new(Notify::new()),
        }
    }
}

impl FakeProcessAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ProcessCall> {
        self.inner.lock().calls.clone()
    }

    /// Commands passed to every spawn, in order
    pub fn spawned(&self) -> Vec<LaunchCommand> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                ProcessCall::Spawn { command, .. } => Some(command.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn spawn_count(&self) -> usize {
        self.spawned().len()
    }

    /// PIDs of children that have not exited
    pub fn live_pids(&self) -> Vec<u32> {
        let mut pids: Vec<u32> = self
            .inner
            .lock()
            .processes
            .iter()
            .filter(|(_, p)| p.exit.is_none())
            .map(|(pid, _)| *pid)
            .collect();
        pids.sort_unstable();
        pids
    }

    /// Make the next spawn fail with `error`
    pub fn fail_next_spawn(&self, error: LaunchError) {
        self.inner.lock().fail_next_spawn = Some(error);
    }

    /// Children ignore SIGTERM and only die on kill
    pub fn set_ignore_terminate(&self, ignore: bool) {
        self.inner.lock().ignore_terminate = ignore;
    }

    /// Lines every spawned child writes to stdout
    pub fn set_output(&self, lines: Vec<String>) {
        self.inner.lock().output = lines;
    }

    /// Simulate the child exiting on its own with `code`
    pub fn crash(&self, pid: u32, code: i32) {
        self.set_exit(pid, ProcessExit::code(code));
    }

    fn set_exit(&self, pid: u32, exit: ProcessExit) {
        if let Some(process) = self.inner.lock().processes.get_mut(&pid) {
            process.exit.get_or_insert(exit);
        }
        self.exited.notify_waiters();
    }

    fn exit_of(&self, pid: u32) -> Option<ProcessExit> {
        self.inner
            .lock()
            .processes
            .get(&pid)
            .and_then(|p| p.exit)
    }
}

#[async_trait]
impl ProcessAdapter for FakeProcessAdapter {
    type Child = FakeChild;

    async fn spawn(
        &self,
        command: &LaunchCommand,
        logs: &LogChannel,
    ) -> Result<FakeChild, LaunchError> {
        let (pid, lines) = {
            let mut inner = self.inner.lock();
            if let Some(error) = inner.fail_next_spawn.take() {
                return Err(error);
            }

            let pid = inner.next_pid;
            inner.next_pid += 1;
            inner.processes.insert(pid, FakeProcess::default());
            inner.calls.push(ProcessCall::Spawn {
                command: command.clone(),
                pid,
            });
            (pid, inner.output.clone())
        };

        for line in lines {
            logs.emit(LogSource::Stdout, line);
        }

        Ok(FakeChild {
            pid,
            adapter: self.clone(),
        })
    }
}

/// Child handle returned by [`FakeProcessAdapter`]
pub struct FakeChild {
    pid: u32,
    adapter: FakeProcessAdapter,
}

#[async_trait]
impl ChildProcess for FakeChild {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn try_wait(&mut self) -> Option<ProcessExit> {
        self.adapter.exit_of(self.pid)
    }

    async fn terminate(&mut self) {
        let ignore = {
            let mut inner = self.adapter.inner.lock();
            inner.calls.push(ProcessCall::Terminate { pid: self.pid });
            inner.ignore_terminate
        };
        if !ignore {
            self.adapter.set_exit(self.pid, ProcessExit::signaled(SIGTERM));
        }
    }

    async fn wait(&mut self) -> ProcessExit {
        loop {
            let notified = self.adapter.exited.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if let Some(exit) = self.adapter.exit_of(self.pid) {
                return exit;
            }
            notified.await;
        }
    }

    async fn kill(&mut self) -> ProcessExit {
        self.adapter
            .inner
            .lock()
            .calls
            .push(ProcessCall::Kill { pid: self.pid });
        self.adapter.set_exit(self.pid, ProcessExit::signaled(SIGKILL));
        self.adapter
            .exit_of(self.pid)
            .unwrap_or_else(ProcessExit::unknown)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
