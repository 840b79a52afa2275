// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;
use std::path::Path;

use super::*;

fn write_bytes(path: &Path, size: u64) {
    let mut f = std::fs::File::create(path).unwrap();
    f.write_all(&vec![b'x'; size as usize]).unwrap();
}

fn size(dir: &Path, name: &str) -> u64 {
    std::fs::metadata(dir.join(name)).unwrap().len()
}

#[test]
fn startup_marker_is_appended_with_pid() {
    let dir = tempfile::tempdir().unwrap();
    let log = DaemonLog::new(dir.path().join("logs/server.log"));

    log.write_startup_marker().unwrap();
    log.write_startup_marker().unwrap();

    let content = std::fs::read_to_string(log.path()).unwrap();
    let expected = format!("{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id());
    assert_eq!(content.lines().collect::<Vec<_>>(), vec![expected.as_str(); 2]);
}

#[test]
fn startup_error_follows_marker() {
    let dir = tempfile::tempdir().unwrap();
    let log = DaemonLog::new(dir.path().join("server.log"));

    log.write_startup_marker().unwrap();
    log.write_startup_error(&LifecycleError::NoStateDir);

    let content = std::fs::read_to_string(log.path()).unwrap();
    assert_eq!(
        content.lines().last(),
        Some("ERROR Failed to start daemon: Could not determine state directory")
    );
}

#[test]
fn rotate_skips_small_file() {
    let dir = tempfile::tempdir().unwrap();
    let log = DaemonLog::new(dir.path().join("server.log"));
    write_bytes(log.path(), 1024);

    log.rotate_if_needed();

    assert!(log.path().exists(), "small log should not be rotated");
    assert!(!dir.path().join("server.log.1").exists());
}

#[test]
fn rotate_shifts_existing_rotations() {
    let dir = tempfile::tempdir().unwrap();
    let log = DaemonLog::new(dir.path().join("server.log"));
    write_bytes(&dir.path().join("server.log.1"), 100);
    write_bytes(&dir.path().join("server.log.2"), 200);
    write_bytes(log.path(), MAX_LOG_SIZE + 1);

    log.rotate_if_needed();

    assert!(!log.path().exists());
    assert_eq!(size(dir.path(), "server.log.1"), MAX_LOG_SIZE + 1);
    assert_eq!(size(dir.path(), "server.log.2"), 100);
    assert_eq!(size(dir.path(), "server.log.3"), 200);
}

#[test]
fn rotate_drops_oldest_when_full() {
    let dir = tempfile::tempdir().unwrap();
    let log = DaemonLog::new(dir.path().join("server.log"));
    for n in 1..=MAX_ROTATIONS {
        write_bytes(&dir.path().join(format!("server.log.{n}")), u64::from(n) * 100);
    }
    write_bytes(log.path(), MAX_LOG_SIZE + 1);

    log.rotate_if_needed();

    // .3 is now the old .2, the old .3 is gone
    assert_eq!(size(dir.path(), "server.log.3"), 200);
    assert!(!dir.path().join("server.log.4").exists());
}

#[test]
fn rotate_noop_when_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    DaemonLog::new(dir.path().join("server.log")).rotate_if_needed();
    assert!(!dir.path().join("server.log.1").exists());
}
