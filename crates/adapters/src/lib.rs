// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O: supervised processes, backups, updates

pub mod archive;
mod env;
pub mod process;
pub mod relay;
pub mod subprocess;
pub mod traced;
pub mod updater;

pub use archive::{create_backup, ArchiveError, ArchiveReport, ArchiveRequest};
pub use process::{
    ChildProcess, ExitPoll, LaunchCommand, LaunchError, OsProcessAdapter, ProcessAdapter,
    ProcessHandle, ProcessState, StopOutcome,
};
pub use traced::{TracedChild, TracedProcessAdapter};
pub use updater::{run_update, UpdateError, UpdateRequest};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use process::{FakeChild, FakeProcessAdapter, ProcessCall};
