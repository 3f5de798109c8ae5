// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log file setup: a non-blocking `tracing-appender` file writer plus
//! `RUST_LOG`-driven `EnvFilter`.

use crate::error::DaemonError;
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn setup(log_path: &Path) -> Result<tracing_appender::non_blocking::WorkerGuard, DaemonError> {
    let dir = log_path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|source| DaemonError::LogFile { path: log_path.display().to_string(), source })?;

    let file_name = log_path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("yaschedulerd.log"));
    let appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(non_blocking)).init();

    Ok(guard)
}
