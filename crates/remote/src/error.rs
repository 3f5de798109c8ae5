// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `RemoteError`: the remote-driver slice of the closed error-kind table
//! in §7 (`SSHConnectTransient`, `SSHAuthPermanent`, `EngineDeployFailed`).
//! `SFTPTransferPartial` is deliberately not a variant here — §4.2 says
//! partial transfer failure is "returned to caller with per-file list",
//! i.e. reported through [`crate::machine::TransferOutcome`], not raised.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("ssh connect failed for {ip}: {message}")]
    ConnectTransient { ip: String, message: String },

    #[error("ssh authentication failed for {ip}: {message}")]
    AuthPermanent { ip: String, message: String },

    #[error("remote command failed: {0}")]
    Exec(String),

    #[error("engine '{engine}' deploy failed on {ip}: {message}")]
    DeployFailed { ip: String, engine: String, message: String },

    #[error(transparent)]
    QueueFull(#[from] yascheduler_core::QueueFull),
}
