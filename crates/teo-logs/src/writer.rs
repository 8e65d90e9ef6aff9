// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDate;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum WriteError {
    /// Archives are never overwritten; delete the old one to export the day again.
    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// `<YYYYMMDD>-<zone id>.xz`
pub fn archive_filename(date: NaiveDate, zone_id: &str) -> String {
    format!("{}-{zone_id}.xz", date.format("%Y%m%d"))
}

pub fn archive_path(dir: &Path, date: NaiveDate, zone_id: &str) -> PathBuf {
    dir.join(archive_filename(date, zone_id))
}

/// Fails early when the archive for `(date, zone_id)` is already on disk.
///
/// Only an optimisation: [`write_archive`] creates the file exclusively either way.
pub fn ensure_available(dir: &Path, date: NaiveDate, zone_id: &str) -> Result<PathBuf, WriteError> {
    let path = archive_path(dir, date, zone_id);
    if path.exists() {
        return Err(WriteError::AlreadyExists(path));
    }
    Ok(path)
}

/// Creates the archive file exclusively and writes `data` to it.
pub fn write_archive(
    dir: &Path,
    date: NaiveDate,
    zone_id: &str,
    data: &[u8],
) -> Result<PathBuf, WriteError> {
    let path = archive_path(dir, date, zone_id);
    let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            return Err(WriteError::AlreadyExists(path))
        }
        Err(source) => return Err(WriteError::Io { path, source }),
    };
    if let Err(source) = file.write_all(data).and_then(|()| file.flush()) {
        return Err(WriteError::Io { path, source });
    }
    info!("Wrote {} bytes to {}", data.len(), path.display());
    Ok(path)
}
