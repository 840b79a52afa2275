// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent daemon settings (`settings.toml` in the state directory).
//!
//! A missing file yields the defaults. A file that cannot be parsed or
//! fails validation is logged and replaced by the defaults in memory; it is
//! only overwritten when the controller changes a setting.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sk_adapters::{ArchiveRequest, LaunchCommand, UpdateRequest};
use sk_core::{RestartSchedule, ScheduleError};
use sk_engine::SupervisorTiming;
use thiserror::Error;

use crate::protocol::{PathChanges, SettingsSummary};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid restart_times: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("invalid {field}: {message}")]
    Invalid {
        field: &'static str,
        message: &'static str,
    },

    #[error("invalid {field}: parent directory of {} does not exist", path.display())]
    MissingParent { field: &'static str, path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Daily restart times, `H:MM` or `HH:MM`.
    pub restart_times: Vec<String>,
    pub executable: PathBuf,
    pub args: Vec<String>,
    /// Working directory for the server; relative executables resolve against it.
    pub working_dir: Option<PathBuf>,
    /// Start the server as soon as the daemon is up.
    pub auto_start: bool,

    pub save_dir: PathBuf,
    pub save_files: Vec<String>,
    pub backup_dir: PathBuf,

    pub updater_executable: PathBuf,
    pub install_dir: PathBuf,
    pub app_id: String,

    pub grace_period_secs: u64,
    pub crash_cooldown_secs: u64,
    pub tick_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            restart_times: vec!["12:00".to_string(), "21:00".to_string()],
            executable: PathBuf::from("SCUMServer.exe"),
            args: vec!["-log".to_string(), "-port=7777".to_string()],
            working_dir: None,
            auto_start: false,
            save_dir: PathBuf::from("C:/Scum/SCUMServer/SCUM/Saved/SaveFiles/"),
            save_files: vec![
                "SCUM.db".to_string(),
                "SCUM.db-shm".to_string(),
                "SCUM.db-wal".to_string(),
            ],
            backup_dir: PathBuf::from("C:/Scum/SCUMServer/backup/"),
            updater_executable: PathBuf::from("C:/steamcmd/steamcmd.exe"),
            install_dir: PathBuf::from("C:/Scum/SCUMServer/"),
            app_id: "3792580".to_string(),
            grace_period_secs: 10,
            crash_cooldown_secs: 5,
            tick_ms: 1000,
        }
    }
}

impl Settings {
    /// Read and validate settings. Returns `Ok(None)` when the file does not exist.
    pub fn read(path: &Path) -> Result<Option<Self>, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let settings: Settings = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(Some(settings))
    }

    /// Read settings, falling back to the defaults on any error.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::read(path) {
            Ok(Some(settings)) => {
                tracing::info!(path = %path.display(), "settings loaded");
                settings
            }
            Ok(None) => {
                tracing::info!(path = %path.display(), "no settings file, using defaults");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "using default settings");
                Self::default()
            }
        }
    }

    /// Write settings atomically (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, content).map_err(write_err)?;
        std::fs::rename(&tmp, path).map_err(write_err)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.schedule()?;
        if self.executable.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "executable",
                message: "must not be empty",
            });
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "tick_ms",
                message: "must be greater than zero",
            });
        }
        if self.app_id.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "app_id",
                message: "must not be empty",
            });
        }
        Ok(())
    }

    pub fn schedule(&self) -> Result<RestartSchedule, ConfigError> {
        Ok(RestartSchedule::parse(&self.restart_times)?)
    }

    /// Store `schedule` in its canonical `HH:MM` form.
    pub fn set_schedule(&mut self, schedule: &RestartSchedule) {
        self.restart_times = schedule.times().iter().map(|t| t.to_string()).collect();
    }

    /// Overwrite the paths present in `changes`. Check them first with
    /// [`check_paths`].
    pub fn apply_paths(&mut self, changes: &PathChanges) {
        let PathChanges {
            save_dir,
            backup_dir,
            updater_executable,
            install_dir,
        } = changes.clone();
        if let Some(path) = save_dir {
            self.save_dir = path;
        }
        if let Some(path) = backup_dir {
            self.backup_dir = path;
        }
        if let Some(path) = updater_executable {
            self.updater_executable = path;
        }
        if let Some(path) = install_dir {
            self.install_dir = path;
        }
    }

    pub fn summary(&self) -> SettingsSummary {
        SettingsSummary {
            save_dir: self.save_dir.clone(),
            save_files: self.save_files.clone(),
            backup_dir: self.backup_dir.clone(),
            updater_executable: self.updater_executable.clone(),
            install_dir: self.install_dir.clone(),
            auto_start: self.auto_start,
        }
    }

    pub fn launch_command(&self) -> LaunchCommand {
        let command = LaunchCommand::new(&self.executable, self.args.clone());
        match &self.working_dir {
            Some(dir) => command.with_working_dir(dir),
            None => command,
        }
    }

    pub fn archive_request(&self) -> ArchiveRequest {
        ArchiveRequest {
            save_dir: self.save_dir.clone(),
            save_files: self.save_files.clone(),
            backup_dir: self.backup_dir.clone(),
        }
    }

    pub fn update_request(&self) -> UpdateRequest {
        UpdateRequest {
            executable: self.updater_executable.clone(),
            install_dir: self.install_dir.clone(),
            app_id: self.app_id.clone(),
        }
    }

    /// Loop timing; `tick_override` (from the environment) wins over `tick_ms`.
    pub fn timing(&self, tick_override: Option<Duration>) -> SupervisorTiming {
        SupervisorTiming {
            tick: tick_override.unwrap_or(Duration::from_millis(self.tick_ms)),
            grace_period: Duration::from_secs(self.grace_period_secs),
            crash_cooldown: Duration::from_secs(self.crash_cooldown_secs),
        }
    }
}

/// Every requested path must have an existing parent directory; the path
/// itself may not exist yet.
pub fn check_paths(changes: &PathChanges) -> Result<(), ConfigError> {
    for (field, path) in changes.entries() {
        let parent_exists = path
            .parent()
            .is_some_and(|parent| !parent.as_os_str().is_empty() && parent.is_dir());
        if !parent_exists {
            return Err(ConfigError::MissingParent {
                field,
                path: path.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
