// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ConfigError`: the closed set of ways loading the INI file can fail.
//!
//! §7: "ConfigInvalid | config loader | Fatal at startup." Every variant
//! here maps to that one disposition; callers never retry a config load.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config file {path}: {source}")]
    Load { path: String, #[source] source: ini::Error },

    #[error("missing required section [{0}]")]
    MissingSection(String),

    #[error("missing required key '{key}' in section [{section}]")]
    MissingKey { section: String, key: String },

    #[error("invalid value for '{key}' in section [{section}]: {message}")]
    InvalidValue { section: String, key: String, message: String },

    #[error("engine '{0}': exactly one of deploy_local_files, deploy_local_archive, deploy_remote_archive is required")]
    AmbiguousDeploySource(String),

    #[error("engine '{0}': exactly one of check_pname, check_cmd is required")]
    AmbiguousLivenessCheck(String),

    #[error("engine '{0}': invalid definition: {1}")]
    EngineDef(String, #[source] yascheduler_core::EngineDefError),

    #[error("cloud '{0}': repeated section name")]
    DuplicateCloud(String),

    #[error("cloud '{0}': unknown or incomplete 'kind' ({1})")]
    InvalidCloudKind(String, String),
}
