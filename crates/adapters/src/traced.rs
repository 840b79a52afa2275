// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::process::{ChildProcess, LaunchCommand, LaunchError, ProcessAdapter};
use async_trait::async_trait;
use sk_core::{LogChannel, ProcessExit};
use std::time::Duration;
use tracing::Instrument;

/// Wrapper that adds tracing to any ProcessAdapter
#[derive(Clone)]
pub struct TracedProcessAdapter<A> {
    inner: A,
}

impl<A> TracedProcessAdapter<A> {
    pub fn new(inner: A) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<A: ProcessAdapter> ProcessAdapter for TracedProcessAdapter<A> {
    type Child = TracedChild<A::Child>;

    async fn spawn(
        &self,
        command: &LaunchCommand,
        logs: &LogChannel,
    ) -> Result<Self::Child, LaunchError> {
        let span = tracing::info_span!("process.launch", program = %command.program.display());
        async {
            tracing::info!(args = ?command.args, "starting");
            let start = std::time::Instant::now();
            let result = self.inner.spawn(command, logs).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(child) => tracing::info!(pid = child.pid(), elapsed_ms, "process started"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "launch failed"),
            }
            result.map(|inner| TracedChild { inner })
        }
        .instrument(span)
        .await
    }
}

/// Child wrapper produced by [`TracedProcessAdapter`]
pub struct TracedChild<C> {
    inner: C,
}

#[async_trait]
impl<C: ChildProcess> ChildProcess for TracedChild<C> {
    fn pid(&self) -> u32 {
        self.inner.pid()
    }

    fn try_wait(&mut self) -> Option<ProcessExit> {
        let result = self.inner.try_wait();
        tracing::trace!(pid = self.inner.pid(), exit = ?result, "polled");
        result
    }

    async fn terminate(&mut self) {
        let pid = self.inner.pid();
        tracing::info_span!("process.terminate", pid).in_scope(|| tracing::info!("sending SIGTERM"));
        self.inner.terminate().await;
    }

    async fn wait(&mut self) -> ProcessExit {
        self.inner.wait().await
    }

    async fn kill(&mut self) -> ProcessExit {
        let pid = self.inner.pid();
        let start = std::time::Instant::now();
        let exit = self.inner.kill().await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        tracing::info_span!("process.kill", pid)
            .in_scope(|| tracing::warn!(%exit, elapsed_ms, "killed"));
        exit
    }

    async fn drain_output(&mut self, timeout: Duration) {
        self.inner.drain_output(timeout).await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
