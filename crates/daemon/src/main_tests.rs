// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::Invocation;

fn parse(args: &[&str]) -> Invocation {
    Invocation::parse(args.iter().map(|s| s.to_string()))
}

#[yare::parameterized(
    long_version = { "--version" },
    short_upper = { "-V" },
    short_lower = { "-v" },
)]
fn version_flags(flag: &str) {
    assert_eq!(parse(&[flag]), Invocation::Version);
}

#[yare::parameterized(
    long_help = { "--help" },
    short_help = { "-h" },
    word = { "help" },
)]
fn help_flags(flag: &str) {
    assert_eq!(parse(&[flag]), Invocation::Help);
}

#[test]
fn no_arguments_runs_daemon() {
    assert_eq!(parse(&[]), Invocation::Run);
}

#[test]
fn anything_else_is_rejected() {
    assert_eq!(
        parse(&["--foreground"]),
        Invocation::Unexpected("--foreground".to_string())
    );
}
