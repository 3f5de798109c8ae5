// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `CloudError`: the provider-driver slice of §7's closed error-kind
//! table (`CloudAPIError`). The coordinator's reaction — "decrement
//! in-flight counter; provider may be temporarily shunned" — lives in
//! `crates/engine`, not here; this crate only classifies what happened.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CloudError {
    #[error("cloud '{provider}' api error: {message}")]
    ApiError { provider: String, message: String },

    #[error("cloud '{provider}': node {ip} did not report ssh readiness within the creation timeout")]
    ReadinessTimeout { provider: String, ip: String },
}

impl CloudError {
    pub fn provider(&self) -> &str {
        match self {
            CloudError::ApiError { provider, .. } => provider,
            CloudError::ReadinessTimeout { provider, .. } => provider,
        }
    }
}
