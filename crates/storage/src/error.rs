// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `StorageError`: the repository's two dispositions (§7 `DBTransient` /
//! `DBPermanent`). Classification happens once, at the sqlx boundary, so
//! every caller above this crate only ever has to match on the two kinds.

use thiserror::Error;
use yascheduler_core::{NodeIp, TaskId};

#[derive(Debug, Error)]
pub enum StorageError {
    /// Connection loss, pool exhaustion, timeouts: the caller retries with
    /// backoff and the reconciler tick survives (§4.1, §7).
    #[error("transient database error: {0}")]
    Transient(#[source] sqlx::Error),

    /// Schema violations and anything else that retrying won't fix: fatal
    /// at the call site (§7).
    #[error("database error: {0}")]
    Permanent(#[source] sqlx::Error),

    #[error("node {0} not found")]
    NodeNotFound(NodeIp),

    #[error("task {0} not found")]
    TaskNotFound(TaskId),
}

/// Classify a raw `sqlx::Error` into transient-vs-permanent per §7.
pub(crate) fn classify(err: sqlx::Error) -> StorageError {
    match &err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StorageError::Transient(err),
        _ => StorageError::Permanent(err),
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
