//! Daemon start, stop and single-instance behavior.

use crate::prelude::*;

#[test]
fn start_version_stop() {
    let site = Site::new();

    site.sk()
        .args(&["daemon", "start"])
        .passes()
        .stdout_eq("Daemon started\n");
    site.sk()
        .args(&["daemon", "--version"])
        .passes()
        .stdout_eq("skd 0.1.0\n");
    assert!(site.daemon_pid().is_some());

    site.sk()
        .args(&["daemon", "stop"])
        .passes()
        .stdout_eq("Daemon stopped\n");

    assert!(!site.state_path().join("daemon.sock").exists());
    assert!(!site.state_path().join("daemon.pid").exists());
}

#[test]
fn start_twice_reports_running_daemon() {
    let site = Site::new();
    site.sk().args(&["daemon", "start"]).passes();

    site.sk()
        .args(&["daemon", "start"])
        .passes()
        .stdout_has("Daemon already running (uptime: ");
}

#[test]
fn second_daemon_refuses_to_start() {
    let site = Site::new();
    site.sk().args(&["daemon", "start"]).passes();
    let pid = site.daemon_pid().unwrap();

    let output = site.skd().output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("skd is already running"), "{stderr}");
    assert!(stderr.contains(&format!("pid: {}", pid)), "{stderr}");

    // The running daemon is untouched
    assert_eq!(site.daemon_pid(), Some(pid));
    site.sk().args(&["status"]).passes().stdout_has("Server:");
}

#[test]
fn startup_is_recorded_in_daemon_log() {
    let site = Site::new();
    site.sk().args(&["daemon", "start"]).passes();

    assert!(
        site.daemon_log().contains("--- skd: starting (pid: "),
        "{}",
        site.daemon_log()
    );
}

#[test]
fn action_command_starts_daemon() {
    let site = Site::new();

    site.sk()
        .args(&["schedule", "04:00"])
        .passes()
        .stdout_has("Restart schedule set to 04:00");

    assert!(site.daemon_pid().is_some());
}
