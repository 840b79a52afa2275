// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Save-file archiver.
//!
//! Bundles the configured save files into a single zstd-compressed tar:
//!
//! ```text
//! save_dir/SCUM.db ─┐
//! save_dir/SCUM.db-wal ─┼─▶ tar ─▶ zstd(3) ─▶ backup_…tar.zst.tmp
//!                   ┘                           │ fsync
//!                                               ▼ rename
//!                               backup_dir/backup_YYYY-MM-DD_HH-MM-SS.tar.zst
//!                                               │ fsync dir
//! ```
//!
//! Blocking I/O; callers on a runtime should use `spawn_blocking`.

use chrono::NaiveDateTime;
use sk_core::{LogChannel, LogSource};
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// zstd compression level for backup bundles.
pub const COMPRESSION_LEVEL: i32 = 3;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("no save files found in {}", .0.display())]
    NoSaveFiles(PathBuf),

    #[error("failed to write backup {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What to back up and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRequest {
    pub save_dir: PathBuf,
    /// File names relative to `save_dir`. Missing files are skipped.
    pub save_files: Vec<String>,
    pub backup_dir: PathBuf,
}

/// Outcome of a successful backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReport {
    pub path: PathBuf,
    /// Names of the files included, in request order.
    pub files: Vec<String>,
    /// Compressed size in bytes.
    pub size: u64,
}

/// Bundle file name for a backup taken at `now`.
pub fn backup_file_name(now: NaiveDateTime) -> String {
    format!("backup_{}.tar.zst", now.format("%Y-%m-%d_%H-%M-%S"))
}

/// Write a backup bundle of every existing save file.
pub fn create_backup(
    request: &ArchiveRequest,
    logs: &LogChannel,
    now: NaiveDateTime,
) -> Result<ArchiveReport, ArchiveError> {
    let present: Vec<(&str, PathBuf)> = request
        .save_files
        .iter()
        .map(|name| (name.as_str(), request.save_dir.join(name)))
        .filter(|(_, path)| path.is_file())
        .collect();
    if present.is_empty() {
        return Err(ArchiveError::NoSaveFiles(request.save_dir.clone()));
    }

    let write_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ArchiveError::Write { path, source }
    };

    std::fs::create_dir_all(&request.backup_dir).map_err(write_err(&request.backup_dir))?;
    let path = request.backup_dir.join(backup_file_name(now));
    let tmp_path = path.with_extension("zst.tmp");

    if let Err(e) = write_bundle(&tmp_path, &present, logs) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(write_err(&path)(e));
    }

    std::fs::rename(&tmp_path, &path).map_err(write_err(&path))?;
    File::open(&request.backup_dir)
        .and_then(|dir| dir.sync_all())
        .map_err(write_err(&request.backup_dir))?;

    let size = std::fs::metadata(&path).map_err(write_err(&path))?.len();
    tracing::info!(path = %path.display(), files = present.len(), size, "backup written");

    Ok(ArchiveReport {
        path,
        files: present.iter().map(|(name, _)| name.to_string()).collect(),
        size,
    })
}

fn write_bundle(
    tmp_path: &Path,
    files: &[(&str, PathBuf)],
    logs: &LogChannel,
) -> std::io::Result<()> {
    let file = File::create(tmp_path)?;
    let encoder = zstd::Encoder::new(file, COMPRESSION_LEVEL)?;
    let mut builder = tar::Builder::new(encoder);

    for (name, path) in files {
        builder.append_path_with_name(path, name)?;
        tracing::info!(file = name, "added to backup");
        logs.emit(LogSource::Supervisor, format!("Added {} to backup", name));
    }

    let file = builder.into_inner()?.finish()?;
    file.sync_all()
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
