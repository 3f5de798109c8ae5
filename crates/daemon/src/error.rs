// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `DaemonError`: the thin wrapper over the per-crate boundary errors
//! that can surface at startup, before a reconciler tick exists to
//! swallow anything (§7: "ConfigInvalid | config loader | Fatal at
//! startup", and `DBPermanent` likewise).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error(transparent)]
    Config(#[from] yascheduler_config::ConfigError),

    #[error(transparent)]
    Storage(#[from] yascheduler_storage::StorageError),

    #[error("pidfile {path}: another yaschedulerd is already running (pid {pid})")]
    AlreadyRunning { path: String, pid: String },

    #[error("pidfile {path}: {source}")]
    Pidfile { path: String, #[source] source: std::io::Error },

    #[error("log file {path}: {source}")]
    LogFile { path: String, #[source] source: std::io::Error },
}
