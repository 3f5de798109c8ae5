// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pidfile locking: an advisory `flock` held for the process lifetime,
//! via `fs2` — one OS-level lock so two `yaschedulerd` invocations
//! against the same `-p pidfile` can never both believe they own it.

use crate::error::DaemonError;
use fs2::FileExt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Holds the lock for as long as it's alive; dropping it (process exit)
/// releases the `flock` automatically.
pub struct Pidfile {
    file: File,
    path: String,
}

impl Pidfile {
    pub fn acquire(path: &Path) -> Result<Self, DaemonError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|source| DaemonError::Pidfile { path: path.display().to_string(), source })?;
        }
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|source| DaemonError::Pidfile { path: path.display().to_string(), source })?;

        if file.try_lock_exclusive().is_err() {
            let pid = std::fs::read_to_string(path).unwrap_or_default().trim().to_string();
            return Err(DaemonError::AlreadyRunning { path: path.display().to_string(), pid });
        }

        file.set_len(0).map_err(|source| DaemonError::Pidfile { path: path.display().to_string(), source })?;
        writeln!(file, "{}", std::process::id())
            .map_err(|source| DaemonError::Pidfile { path: path.display().to_string(), source })?;

        Ok(Self { file, path: path.display().to_string() })
    }
}

impl Drop for Pidfile {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
        let _ = std::fs::remove_file(&self.path);
    }
}
