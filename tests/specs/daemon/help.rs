//! skd flag handling.

use crate::prelude::*;

#[test]
fn version_flag() {
    let site = Site::new();
    site.skd().arg("--version").assert().success().stdout("skd 0.1.0\n");
}

#[test]
fn help_mentions_state_dir() {
    let site = Site::new();
    let output = site.skd().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("SK_STATE_DIR"), "{stdout}");
}

#[test]
fn unexpected_argument_fails() {
    let site = Site::new();
    let output = site.skd().arg("--bogus").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unexpected argument '--bogus'"), "{stderr}");
}
