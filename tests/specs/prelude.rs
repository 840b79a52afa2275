//! Test helpers for behavioral specifications.
//!
//! Provides a small DSL for driving the sk CLI against an isolated daemon.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

// Aggressive timeouts for fast tests.
const SK_TIMEOUT_CONNECT_MS: &str = "2000";
const SK_TIMEOUT_EXIT_MS: &str = "5000";
const SK_TIMEOUT_IPC_MS: &str = "1000";
const SK_CONNECT_POLL_MS: &str = "5";
const SK_TICK_MS: &str = "50";

// Spec polling timeouts
pub const SPEC_POLL_INTERVAL_MS: u64 = 10;
pub const SPEC_WAIT_MAX_MS: u64 = 5000;

/// Returns the path to a workspace binary.
///
/// Falls back to resolving relative to the test binary itself when
/// CARGO_MANIFEST_DIR is stale.
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug").join(name);
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    // The test binary lives at target/debug/deps/specs-<hash>
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

fn sk_binary() -> PathBuf {
    binary_path("sk")
}

pub fn skd_binary() -> PathBuf {
    binary_path("skd")
}

/// Create a CLI builder for sk commands
pub fn cli() -> CliBuilder {
    CliBuilder::new()
}

/// High-level CLI builder for fluent test assertions
pub struct CliBuilder {
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl CliBuilder {
    fn new() -> Self {
        Self {
            args: Vec::new(),
            envs: vec![
                (
                    "SK_DAEMON_BINARY".into(),
                    skd_binary().to_string_lossy().into(),
                ),
                ("SK_TIMEOUT_CONNECT_MS".into(), SK_TIMEOUT_CONNECT_MS.into()),
                ("SK_TIMEOUT_EXIT_MS".into(), SK_TIMEOUT_EXIT_MS.into()),
                ("SK_TIMEOUT_IPC_MS".into(), SK_TIMEOUT_IPC_MS.into()),
                ("SK_CONNECT_POLL_MS".into(), SK_CONNECT_POLL_MS.into()),
                ("SK_TICK_MS".into(), SK_TICK_MS.into()),
            ],
        }
    }

    /// Add CLI arguments
    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    /// Set environment variable
    pub fn env(mut self, key: &str, value: impl AsRef<Path>) -> Self {
        self.envs.push((
            key.to_string(),
            value.as_ref().to_string_lossy().to_string(),
        ));
        self
    }

    /// Build the command without running it
    pub fn command(self) -> Command {
        let mut cmd = Command::new(sk_binary());
        cmd.args(&self.args);
        cmd.env_remove("SK_STATE_DIR");
        cmd.env_remove("RUST_LOG");
        for (key, value) in self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    /// Run and expect success (exit code 0)
    pub fn passes(self) -> RunAssert {
        let output = self.command().output().expect("command should run");
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    /// Run and expect failure (non-zero exit code)
    pub fn fails(self) -> RunAssert {
        let output = self.command().output().expect("command should run");
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    /// Run without asserting on the exit code
    pub fn output(self) -> RunAssert {
        let output = self.command().output().expect("command should run");
        RunAssert { output }
    }
}

/// Result of a CLI run for chaining assertions
pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn code(&self) -> Option<i32> {
        self.output.status.code()
    }

    /// Assert stdout equals expected exactly (with diff on failure).
    pub fn stdout_eq(self, expected: &str) -> Self {
        similar_asserts::assert_eq!(self.stdout(), expected);
        self
    }

    /// Assert stdout contains substring.
    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            stdout.contains(expected),
            "stdout does not contain '{}'\nstdout: {}",
            expected,
            stdout
        );
        self
    }

    /// Assert stderr contains substring.
    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            stderr.contains(expected),
            "stderr does not contain '{}'\nstderr: {}",
            expected,
            stderr
        );
        self
    }
}

// =============================================================================
// Polling
// =============================================================================

/// Poll a condition until it returns true or timeout is reached.
pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_millis(timeout_ms);
    let poll_interval = std::time::Duration::from_millis(SPEC_POLL_INTERVAL_MS);

    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(poll_interval);
    }
    false
}

// =============================================================================
// Site
// =============================================================================

/// Game server stand-in: prints a line, then waits to be terminated.
const FAKE_SERVER: &str = "#!/bin/sh\necho \"server up $*\"\nexec sleep 600\n";

/// Updater stand-in: echoes its arguments and exits with `$FAKE_UPDATE_EXIT`.
const FAKE_UPDATER: &str = "#!/bin/sh\necho \"updating $*\"\nexit ${FAKE_UPDATE_EXIT:-0}\n";

/// An isolated server installation plus daemon state directory.
pub struct Site {
    dir: tempfile::TempDir,
}

impl Site {
    /// Site with a fake server and updater, configured through settings.toml.
    pub fn new() -> Self {
        let site = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        std::fs::create_dir_all(site.state_path()).unwrap();
        site.script("bin/server.sh", FAKE_SERVER);
        site.script("bin/steamcmd.sh", FAKE_UPDATER);
        site.write_settings("");
        site
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.path().join("state")
    }

    fn script(&self, rel: &str, content: &str) {
        let path = self.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    /// Write settings.toml with the site defaults plus `extra` lines.
    ///
    /// `extra` must not repeat a default key.
    pub fn write_settings(&self, extra: &str) {
        let executable = self.path().join("bin/server.sh");
        self.write_settings_for(&executable, extra);
    }

    /// Like [`Site::write_settings`] but launching `executable`.
    pub fn write_settings_for(&self, executable: &Path, extra: &str) {
        let root = self.path().display();
        let settings = format!(
            "{extra}\n\
             executable = \"{exe}\"\n\
             args = [\"-port=7777\"]\n\
             save_dir = \"{root}/saves\"\n\
             backup_dir = \"{root}/backups\"\n\
             updater_executable = \"{root}/bin/steamcmd.sh\"\n\
             install_dir = \"{root}/install\"\n\
             grace_period_secs = 1\n\
             crash_cooldown_secs = 1\n",
            exe = executable.display(),
        );
        std::fs::write(self.state_path().join("settings.toml"), settings).unwrap();
    }

    /// Write a save file into the save directory
    pub fn save_file(&self, name: &str, content: &str) {
        let saves = self.path().join("saves");
        std::fs::create_dir_all(&saves).unwrap();
        std::fs::write(saves.join(name), content).unwrap();
    }

    pub fn settings(&self) -> String {
        std::fs::read_to_string(self.state_path().join("settings.toml")).unwrap()
    }

    /// Run sk against this site's daemon
    pub fn sk(&self) -> CliBuilder {
        cli().env("SK_STATE_DIR", self.state_path())
    }

    /// Run skd directly with this site's state directory
    pub fn skd(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::new(skd_binary());
        cmd.env("SK_STATE_DIR", self.state_path());
        cmd
    }

    /// Read the daemon log file contents (for debugging test failures)
    pub fn daemon_log(&self) -> String {
        std::fs::read_to_string(self.state_path().join("logs/server.log"))
            .unwrap_or_else(|_| "(no daemon log)".to_string())
    }

    pub fn daemon_pid(&self) -> Option<u32> {
        std::fs::read_to_string(self.state_path().join("daemon.pid"))
            .ok()?
            .trim()
            .parse()
            .ok()
    }
}

impl Drop for Site {
    fn drop(&mut self) {
        // Always try to stop daemon (no-op if not running)
        let mut cmd = self.sk().args(&["daemon", "stop"]).command();
        cmd.stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null());
        let _ = cmd.status();
    }
}
