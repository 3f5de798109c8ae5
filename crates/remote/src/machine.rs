// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`Machine`]: the per-node SSH contract of §4.2, as a trait so
//! `yascheduler-engine`'s reconciler can be exercised against
//! [`crate::fake::FakeMachine`] without a real network.

use crate::error::RemoteError;
use async_trait::async_trait;
use yascheduler_core::LivenessCheck;

/// One file to move, named the same on both ends' semantics: `local` is
/// always a path on the machine running the daemon; `remote` is always a
/// path on the managed node (absolute-vs-relative per §4.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTransfer {
    pub local: String,
    pub remote: String,
}

impl FileTransfer {
    pub fn new(local: impl Into<String>, remote: impl Into<String>) -> Self {
        Self { local: local.into(), remote: remote.into() }
    }
}

/// Outcome of a bulk SFTP transfer. Never an error by itself — §4.2:
/// "partial success is reported, not hidden."
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferOutcome {
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl TransferOutcome {
    pub fn all_ok(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// One remote host. Implementations own a single connection; operations
/// are idempotent where the table in §4.2 says so.
#[async_trait]
pub trait Machine: Send + Sync {
    /// Normalized platform tag (e.g. `debian-10`, `windows-11`). Cached
    /// per-connection by implementations — callers may call this freely.
    async fn probe_platform(&self) -> Result<String, RemoteError>;

    async fn probe_cpus(&self) -> Result<u16, RemoteError>;

    /// Whether `path` already exists on the remote, used by the deployer
    /// and by uploads/downloads to stay idempotent.
    async fn path_exists(&self, path: &str) -> Result<bool, RemoteError>;

    /// Idempotent; serializes behind the remote package manager's lock.
    async fn install_packages(&self, packages: &[String], platform: &str) -> Result<(), RemoteError>;

    async fn upload(&self, files: &[FileTransfer]) -> Result<TransferOutcome, RemoteError>;

    async fn download(&self, files: &[FileTransfer]) -> Result<TransferOutcome, RemoteError>;

    /// Does not raise on nonzero exit; the caller inspects `exit_code`.
    async fn exec(&self, command: &str) -> Result<ExecOutput, RemoteError>;

    /// Starts a background process whose lifetime survives the SSH
    /// channel close.
    async fn spawn_detached(&self, command: &str, cwd: &str) -> Result<(), RemoteError>;

    async fn process_alive(&self, check: &LivenessCheck) -> Result<bool, RemoteError>;
}
