//! Backups and updates.

use crate::prelude::*;

#[test]
fn backup_archives_save_files() {
    let site = Site::new();
    site.write_settings("save_files = [\"world.db\", \"absent.db\"]");
    site.save_file("world.db", "players");

    site.sk()
        .args(&["backup"])
        .passes()
        .stdout_has("Backup written: ")
        .stdout_has("1 file(s): world.db");

    let archives: Vec<_> = std::fs::read_dir(site.path().join("backups"))
        .unwrap()
        .collect();
    assert_eq!(archives.len(), 1);
}

#[test]
fn backup_refused_while_server_runs() {
    let site = Site::new();
    site.sk().args(&["start"]).passes();

    let run = site.sk().args(&["backup"]).fails();
    assert_eq!(run.code(), Some(2));
    run.stderr_has("busy: server is running; stop it first");
}

#[test]
fn update_runs_updater() {
    let site = Site::new();

    site.sk()
        .args(&["update"])
        .passes()
        .stdout_eq("Update finished (exit code 0)\n");

    let logged = wait_for(SPEC_WAIT_MAX_MS, || {
        site.sk()
            .args(&["logs"])
            .output()
            .stdout()
            .contains("updating")
    });
    assert!(logged, "{}", site.daemon_log());
}

#[test]
fn failed_update_reports_exit_code() {
    let site = Site::new();
    site.sk()
        .args(&["daemon", "start"])
        .env("FAKE_UPDATE_EXIT", "7")
        .passes();

    site.sk()
        .args(&["update"])
        .fails()
        .stderr_has("updater failed with exit code 7");
}
