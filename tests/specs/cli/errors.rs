//! CLI behavior without a daemon and on bad input.

use crate::prelude::*;

#[test]
fn status_without_daemon() {
    let site = Site::new();
    site.sk()
        .args(&["status"])
        .passes()
        .stdout_eq("Daemon not running\n");
}

#[test]
fn status_without_daemon_as_json() {
    let site = Site::new();
    site.sk()
        .args(&["-o", "json", "status"])
        .passes()
        .stdout_eq("{\n  \"status\": \"not_running\"\n}\n");
}

#[test]
fn stop_without_daemon_does_not_start_one() {
    let site = Site::new();
    site.sk()
        .args(&["stop"])
        .passes()
        .stdout_eq("Daemon not running\n");
    assert!(!site.state_path().join("daemon.sock").exists());
}

#[test]
fn daemon_stop_when_not_running() {
    let site = Site::new();
    site.sk()
        .args(&["daemon", "stop"])
        .passes()
        .stdout_eq("Daemon not running\n");
}

#[test]
fn schedule_requires_times() {
    let site = Site::new();
    site.sk().args(&["schedule"]).fails().stderr_has("required");
}

#[test]
fn unknown_subcommand_fails() {
    cli()
        .args(&["frobnicate"])
        .fails()
        .stderr_has("unrecognized subcommand");
}
