//! CLI help and version output.

use crate::prelude::*;

#[test]
fn no_arguments_prints_usage() {
    cli().passes().stdout_has("Usage:");
}

#[test]
fn help_lists_server_commands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("start")
        .stdout_has("backup")
        .stdout_has("schedule")
        .stdout_has("daemon");
}

#[test]
fn version_flag() {
    cli().args(&["--version"]).passes().stdout_eq("sk 0.1.0\n");
}

#[test]
fn daemon_help_lists_subcommands() {
    cli()
        .args(&["daemon", "--help"])
        .passes()
        .stdout_has("start")
        .stdout_has("stop")
        .stdout_has("run");
}
