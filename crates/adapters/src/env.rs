// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the adapters crate.

use std::time::Duration;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// How long to wait for the output relay to flush after exit (default: 2000ms).
pub fn relay_drain_timeout() -> Duration {
    parse_duration_ms("SK_RELAY_DRAIN_MS").unwrap_or(Duration::from_secs(2))
}
