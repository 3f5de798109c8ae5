// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine: the immutable, per-process declaration of a simulation program.
//!
//! §9 DESIGN NOTES: "Dynamic typing → tagged variants. Engine deployment
//! source and liveness check each become closed sum types with a single
//! constructor per variant; mutual exclusion enforced at parse time, not at
//! use time." [`DeploySource`] and [`LivenessCheck`] are exactly that: once
//! constructed, there is no representable "both" or "neither" state, so
//! nothing downstream of construction needs to re-check exclusivity.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Engine identity. Interned as a plain `String` rather than a
/// [`crate::define_id!`] newtype: engine names are operator-chosen config
/// keys (`engine.<name>`), not generated ids.
pub type EngineName = String;

/// Exactly one of: a list of local files, a single local archive, or a
/// remote archive URL (§3, §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeploySource {
    LocalFiles { files: Vec<String> },
    LocalArchive { archive: String },
    RemoteArchive { url: String },
}

/// Exactly one of: a process-name match, or a shell command compared
/// against an expected exit code (§3, §4.2, §4.6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LivenessCheck {
    ProcessName { pname: String },
    ShellCommand { command: String, expected_code: i32 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineDefError {
    #[error("engine '{0}': exactly one of deploy_local_files, deploy_local_archive, deploy_remote_archive is required")]
    AmbiguousDeploySource(String),
    #[error("engine '{0}': exactly one of check_pname, check_cmd is required")]
    AmbiguousLivenessCheck(String),
    #[error("engine '{0}': spawn template references unknown placeholder '{1}'")]
    UnknownPlaceholder(String, String),
    #[error("engine '{0}': {1} must not be empty")]
    EmptyField(String, &'static str),
}

/// Immutable per-process engine declaration (§3). Identity is `name`;
/// configuration changes require a daemon restart (§9: "no hot-reload").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineDef {
    pub name: EngineName,
    pub platforms: HashSet<String>,
    pub platform_packages: Vec<String>,
    pub deploy: DeploySource,
    pub spawn: String,
    pub check: LivenessCheck,
    pub sleep_interval: Duration,
    pub input_files: Vec<String>,
    pub output_files: Vec<String>,
}

impl EngineDef {
    /// Recognized placeholders in a spawn template (§4.6). Kept as a single
    /// source of truth shared by submission-time validation and
    /// dispatch-time rendering via [`crate::spawn::render_template`].
    pub const PLACEHOLDERS: &'static [&'static str] = &["task_path", "engine_path", "ncpus"];

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        platforms: HashSet<String>,
        platform_packages: Vec<String>,
        deploy: DeploySource,
        spawn: String,
        check: LivenessCheck,
        sleep_interval: Duration,
        input_files: Vec<String>,
        output_files: Vec<String>,
    ) -> Result<Self, EngineDefError> {
        let name = name.into();
        if spawn.trim().is_empty() {
            return Err(EngineDefError::EmptyField(name, "spawn"));
        }
        for placeholder in crate::spawn::placeholders_in(&spawn) {
            if !Self::PLACEHOLDERS.contains(&placeholder.as_str()) {
                return Err(EngineDefError::UnknownPlaceholder(name, placeholder));
            }
        }
        Ok(Self {
            name,
            platforms,
            platform_packages,
            deploy,
            spawn,
            check,
            sleep_interval,
            input_files,
            output_files,
        })
    }

    pub fn supports_platform(&self, platform: &str) -> bool {
        self.platforms.contains(platform)
    }
}

#[cfg(test)]
#[path = "engine_def_tests.rs"]
mod tests;
