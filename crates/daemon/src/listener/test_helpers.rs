// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for listener tests: a context wired to a running
//! supervisor over the fake process adapter.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use sk_adapters::FakeProcessAdapter;
use sk_core::FakeClock;
use sk_engine::{SupervisorError, SupervisorTiming};
use tempfile::TempDir;
use tokio::task::JoinHandle;

use super::handle_request;
use crate::lifecycle::DaemonContext;
use crate::protocol::{Request, Response, StatusSummary};
use crate::settings::Settings;

pub(super) type TestContext = DaemonContext<FakeProcessAdapter, FakeClock>;

pub(super) fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 14)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

/// Settings pointing every maintenance path into `dir`.
pub(super) fn settings_in(dir: &Path) -> Settings {
    Settings {
        executable: dir.join("SCUMServer.exe"),
        save_dir: dir.join("saves"),
        backup_dir: dir.join("backups"),
        updater_executable: dir.join("steamcmd.sh"),
        install_dir: dir.join("server"),
        ..Settings::default()
    }
}

pub(super) struct TestDaemon {
    pub fake: FakeProcessAdapter,
    pub clock: FakeClock,
    pub ctx: Arc<TestContext>,
    pub dir: TempDir,
    pub supervisor: JoinHandle<Result<(), SupervisorError>>,
}

impl TestDaemon {
    /// Start at 11:00:00 with settings derived from the temp dir.
    pub fn start() -> Self {
        Self::start_with(|_| {})
    }

    pub fn start_with(customize: impl FnOnce(&mut Settings)) -> Self {
        let dir = TempDir::new().unwrap();
        let mut settings = settings_in(dir.path());
        customize(&mut settings);

        let fake = FakeProcessAdapter::new();
        let clock = FakeClock::at(at(11, 0, 0));
        let (ctx, supervisor) = DaemonContext::build(
            settings,
            dir.path().join("settings.toml"),
            fake.clone(),
            clock.clone(),
            SupervisorTiming::default(),
        )
        .unwrap();
        ctx.spawn_log_collector();
        let supervisor = tokio::spawn(supervisor.run());

        Self {
            fake,
            clock,
            ctx,
            dir,
            supervisor,
        }
    }

    pub async fn request(&self, request: Request) -> Response {
        handle_request(request, &self.ctx).await
    }

    /// Send `request` on its own task so the test can act while it waits.
    pub fn spawn_request(&self, request: Request) -> JoinHandle<Response> {
        let ctx = Arc::clone(&self.ctx);
        tokio::spawn(async move { handle_request(request, &ctx).await })
    }

    pub async fn status(&self) -> StatusSummary {
        match self.request(Request::Status).await {
            Response::Status(summary) => summary,
            other => panic!("expected status, got {other:?}"),
        }
    }

    /// Start the server and return its PID.
    pub async fn start_server(&self) -> u32 {
        match self.request(Request::Start).await {
            Response::Status(StatusSummary {
                running: true,
                pid: Some(pid),
                ..
            }) => pid,
            other => panic!("expected running status, got {other:?}"),
        }
    }

    /// Yield until the fake adapter has seen `count` spawns.
    pub async fn wait_for_spawns(&self, count: usize) {
        for _ in 0..500 {
            if self.fake.spawn_count() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {count} spawns, saw {}", self.fake.spawn_count());
    }

    /// Let the log collector catch up.
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    pub fn log_texts(&self) -> Vec<String> {
        self.ctx
            .log_buffer
            .lock()
            .tail(usize::MAX)
            .into_iter()
            .map(|(_, line)| line.text)
            .collect()
    }
}
