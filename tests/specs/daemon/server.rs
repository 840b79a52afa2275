//! Supervising the server through the daemon.

use crate::prelude::*;

#[test]
fn start_status_logs_stop() {
    let site = Site::new();

    site.sk()
        .args(&["start"])
        .passes()
        .stdout_has("Server running (pid ");

    site.sk()
        .args(&["status"])
        .passes()
        .stdout_has("Server:       running (pid ")
        .stdout_has("Supervisor:   active")
        .stdout_has("bin/server.sh -port=7777");

    let logged = wait_for(SPEC_WAIT_MAX_MS, || {
        site.sk()
            .args(&["logs"])
            .output()
            .stdout()
            .contains("server up -port=7777")
    });
    assert!(logged, "server output never reached the log\n{}", site.daemon_log());

    site.sk()
        .args(&["stop"])
        .passes()
        .stdout_has("Server stopped");
    site.sk()
        .args(&["status"])
        .passes()
        .stdout_has("Server:       stopped");
}

#[test]
fn status_as_json() {
    let site = Site::new();
    site.sk().args(&["daemon", "start"]).passes();

    let out = site.sk().args(&["-o", "json", "status"]).passes().stdout();
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["running"], false);
    assert_eq!(json["phase"], "idle");
}

#[test]
fn auto_start_launches_server_with_daemon() {
    let site = Site::new();
    site.write_settings("auto_start = true");
    site.sk().args(&["daemon", "start"]).passes();

    let running = wait_for(SPEC_WAIT_MAX_MS, || {
        site.sk()
            .args(&["status"])
            .output()
            .stdout()
            .contains("Server:       running")
    });
    assert!(running, "{}", site.daemon_log());
}

#[test]
fn schedule_is_sorted_and_persisted() {
    let site = Site::new();

    site.sk()
        .args(&["schedule", "18:30", "6:00"])
        .passes()
        .stdout_has("Restart schedule set to 06:00, 18:30");

    let settings = site.settings();
    assert!(
        settings.contains("restart_times = [\"06:00\", \"18:30\"]"),
        "{settings}"
    );
}

#[test]
fn invalid_schedule_is_rejected() {
    let site = Site::new();
    site.sk().args(&["daemon", "start"]).passes();

    site.sk()
        .args(&["schedule", "25:00"])
        .fails()
        .stderr_has("25:00");
}

#[test]
fn args_replace_launch_arguments() {
    let site = Site::new();

    site.sk()
        .args(&["args", "--", "-log", "-port=7001"])
        .passes()
        .stdout_has("Server arguments set; applied at the next launch")
        .stdout_has("bin/server.sh -log -port=7001");

    assert!(site.settings().contains("-port=7001"));
}

#[test]
fn missing_executable_halts_supervisor() {
    let site = Site::new();
    site.write_settings_for(&site.path().join("bin/missing.sh"), "");

    site.sk()
        .args(&["start"])
        .fails()
        .stderr_has("supervisor halted: executable not found");

    // The daemon keeps answering after the halt
    site.sk()
        .args(&["status"])
        .passes()
        .stdout_has("Supervisor:   halted")
        .stdout_has("Halted:       executable not found");
}

#[test]
fn paths_change_backup_destination() {
    let site = Site::new();
    let archive = site.path().join("archive");
    let archive = archive.to_str().unwrap();

    site.sk()
        .args(&["paths", "--backup-dir", archive])
        .passes()
        .stdout_has(&format!("Backup dir:   {archive}"));
    assert!(
        site.settings()
            .contains(&format!("backup_dir = \"{archive}\"")),
        "{}",
        site.settings()
    );

    site.save_file("SCUM.db", "state");
    site.sk()
        .args(&["backup"])
        .passes()
        .stdout_has(&format!("Backup written: {archive}/backup_"));
}

#[test]
fn paths_without_parent_directory_are_rejected() {
    let site = Site::new();

    site.sk()
        .args(&["paths", "--install-dir", "/nonexistent/sk/server"])
        .fails()
        .stderr_has(
            "invalid install_dir: parent directory of /nonexistent/sk/server does not exist",
        );
    assert!(site.settings().contains("/install\""));
}

#[test]
fn autostart_survives_daemon_restart() {
    let site = Site::new();

    site.sk()
        .args(&["autostart", "on"])
        .passes()
        .stdout_eq("Auto-start enabled\n");
    assert!(site.settings().contains("auto_start = true"));

    site.sk().args(&["daemon", "stop"]).passes();
    site.sk().args(&["daemon", "start"]).passes();

    let running = wait_for(SPEC_WAIT_MAX_MS, || {
        site.sk()
            .args(&["status"])
            .output()
            .stdout()
            .contains("Server:       running")
    });
    assert!(running, "{}", site.daemon_log());
}
