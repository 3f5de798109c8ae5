// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! INI loading: parse, `%(key)s` interpolation, unknown-key collection,
//! typed section construction (§6).

use crate::error::ConfigError;
use crate::model::{
    CloudConfig, CloudKind, Config, DbConfig, JumpHost, LocalConfig, RateLimits, RemoteConfig, UnknownKey,
};
use ini::Ini;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;
use yascheduler_core::{DeploySource, EngineDef, LivenessCheck};

const ENV_CONF_PATH: &str = "YASCHEDULER_CONF_PATH";
const DEFAULT_CONF_PATH: &str = "/etc/yascheduler/yascheduler.conf";

impl Config {
    /// Resolve the config path from `YASCHEDULER_CONF_PATH` (§6), falling
    /// back to the documented default, then load it.
    pub fn load() -> Result<Config, ConfigError> {
        let path = std::env::var(ENV_CONF_PATH).unwrap_or_else(|_| DEFAULT_CONF_PATH.to_string());
        Self::load_from_path(Path::new(&path))
    }

    pub fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
        let ini = Ini::load_from_file(path)
            .map_err(|source| ConfigError::Load { path: path.display().to_string(), source })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Config, ConfigError> {
        let mut unknown_keys = Vec::new();

        let db = parse_db(ini, &mut unknown_keys)?;
        let local = parse_local(ini, &mut unknown_keys)?;
        let remote = parse_remote(ini, &mut unknown_keys)?;
        let clouds = parse_clouds(ini, &mut unknown_keys)?;
        let engines = parse_engines(ini, &mut unknown_keys)?;

        for key in &unknown_keys {
            tracing::warn!(section = %key.section, key = %key.key, "unknown config key");
        }

        Ok(Config { db, local, remote, clouds, engines, unknown_keys })
    }
}

/// Resolve `%(key)s` interpolation within one section's raw key/value
/// pairs (§6). Interpolation only ever looks within the same section and
/// is re-applied until fixed point (bounded, to tolerate short chains
/// without looping forever on a cyclic reference).
fn interpolated_section(ini: &Ini, section: &str) -> HashMap<String, String> {
    let mut resolved: HashMap<String, String> = ini
        .section(Some(section))
        .map(|props| props.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
        .unwrap_or_default();

    for _ in 0..8 {
        let snapshot = resolved.clone();
        let mut changed = false;
        for value in resolved.values_mut() {
            let substituted = substitute_once(value, &snapshot);
            if &substituted != value {
                *value = substituted;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    resolved
}

fn substitute_once(s: &str, map: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find("%(") {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 2..];
        match after.find(")s") {
            Some(end) => {
                let key = &after[..end];
                match map.get(key) {
                    Some(val) => out.push_str(val),
                    None => out.push_str(&rest[pos..pos + 2 + end + 2]),
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[pos..]);
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

fn mark_unknown(
    section: &str,
    raw: &HashMap<String, String>,
    known: &[&str],
    unknown_keys: &mut Vec<UnknownKey>,
) {
    for key in raw.keys() {
        if !known.contains(&key.as_str()) {
            unknown_keys.push(UnknownKey { section: section.to_string(), key: key.clone() });
        }
    }
}

fn require<'a>(
    raw: &'a HashMap<String, String>,
    section: &str,
    key: &str,
) -> Result<&'a str, ConfigError> {
    raw.get(key)
        .map(|s| s.as_str())
        .ok_or_else(|| ConfigError::MissingKey { section: section.to_string(), key: key.to_string() })
}

fn optional<'a>(raw: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    raw.get(key).map(|s| s.as_str())
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_db(ini: &Ini, unknown_keys: &mut Vec<UnknownKey>) -> Result<DbConfig, ConfigError> {
    const SECTION: &str = "db";
    if ini.section(Some(SECTION)).is_none() {
        return Err(ConfigError::MissingSection(SECTION.to_string()));
    }
    let raw = interpolated_section(ini, SECTION);
    let known = ["host", "port", "database", "user", "password"];
    mark_unknown(SECTION, &raw, &known, unknown_keys);

    let port = optional(&raw, "port").unwrap_or("5432");
    let port: u16 = port.parse().map_err(|_| ConfigError::InvalidValue {
        section: SECTION.to_string(),
        key: "port".to_string(),
        message: format!("'{port}' is not a valid port number"),
    })?;

    Ok(DbConfig {
        host: require(&raw, SECTION, "host")?.to_string(),
        port,
        database: require(&raw, SECTION, "database")?.to_string(),
        user: require(&raw, SECTION, "user")?.to_string(),
        password: optional(&raw, "password").unwrap_or_default().to_string(),
    })
}

fn parse_local(ini: &Ini, unknown_keys: &mut Vec<UnknownKey>) -> Result<LocalConfig, ConfigError> {
    const SECTION: &str = "local";
    if ini.section(Some(SECTION)).is_none() {
        return Err(ConfigError::MissingSection(SECTION.to_string()));
    }
    let raw = interpolated_section(ini, SECTION);
    let known = [
        "data_dir",
        "keys_dir",
        "engines_dir",
        "conn_machine_limit",
        "conn_machine_pending",
        "allocate_limit",
        "allocate_pending",
        "consume_limit",
        "consume_pending",
        "deallocate_limit",
        "deallocate_pending",
        "webhook_reqs_limit",
        "cloud_error_cooloff",
    ];
    mark_unknown(SECTION, &raw, &known, unknown_keys);

    let defaults = RateLimits::default();
    let rate_limits = RateLimits {
        conn_machine_limit: parse_limit(&raw, SECTION, "conn_machine_limit", defaults.conn_machine_limit)?,
        conn_machine_pending: parse_limit(&raw, SECTION, "conn_machine_pending", defaults.conn_machine_pending)?,
        allocate_limit: parse_limit(&raw, SECTION, "allocate_limit", defaults.allocate_limit)?,
        allocate_pending: parse_limit(&raw, SECTION, "allocate_pending", defaults.allocate_pending)?,
        consume_limit: parse_limit(&raw, SECTION, "consume_limit", defaults.consume_limit)?,
        consume_pending: parse_limit(&raw, SECTION, "consume_pending", defaults.consume_pending)?,
        deallocate_limit: parse_limit(&raw, SECTION, "deallocate_limit", defaults.deallocate_limit)?,
        deallocate_pending: parse_limit(&raw, SECTION, "deallocate_pending", defaults.deallocate_pending)?,
        webhook_reqs_limit: parse_limit(&raw, SECTION, "webhook_reqs_limit", defaults.webhook_reqs_limit)?,
    };
    let cloud_error_cooloff = parse_limit(&raw, SECTION, "cloud_error_cooloff", 5)? as u32;

    Ok(LocalConfig {
        data_dir: require(&raw, SECTION, "data_dir")?.to_string(),
        keys_dir: require(&raw, SECTION, "keys_dir")?.to_string(),
        engines_dir: require(&raw, SECTION, "engines_dir")?.to_string(),
        rate_limits,
        cloud_error_cooloff,
    })
}

/// Parse an optional `[local]` integer key, falling back to `default`
/// (§5's rate-limit families and §4.5's `cloud_error_cooloff` are all
/// optional with documented defaults).
fn parse_limit(
    raw: &HashMap<String, String>,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, ConfigError> {
    match optional(raw, key) {
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            message: "not a non-negative integer".to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_remote(ini: &Ini, unknown_keys: &mut Vec<UnknownKey>) -> Result<RemoteConfig, ConfigError> {
    const SECTION: &str = "remote";
    if ini.section(Some(SECTION)).is_none() {
        return Err(ConfigError::MissingSection(SECTION.to_string()));
    }
    let raw = interpolated_section(ini, SECTION);
    let known = ["engines_dir", "tasks_dir"];
    mark_unknown(SECTION, &raw, &known, unknown_keys);

    Ok(RemoteConfig {
        engines_dir: require(&raw, SECTION, "engines_dir")?.to_string(),
        tasks_dir: require(&raw, SECTION, "tasks_dir")?.to_string(),
    })
}

fn parse_clouds(ini: &Ini, unknown_keys: &mut Vec<UnknownKey>) -> Result<Vec<CloudConfig>, ConfigError> {
    let mut seen = HashSet::new();
    let mut clouds = Vec::new();

    for section_name in ini.sections().flatten() {
        let Some(name) = section_name.strip_prefix("cloud.") else { continue };
        if !seen.insert(name.to_string()) {
            return Err(ConfigError::DuplicateCloud(name.to_string()));
        }
        clouds.push(parse_one_cloud(ini, section_name, name, unknown_keys)?);
    }
    Ok(clouds)
}

fn parse_one_cloud(
    ini: &Ini,
    section: &str,
    name: &str,
    unknown_keys: &mut Vec<UnknownKey>,
) -> Result<CloudConfig, ConfigError> {
    let raw = interpolated_section(ini, section);
    let kind_str = require(&raw, section, "kind")?;

    let (kind, known_extra): (CloudKind, &[&str]) = match kind_str {
        "openstack" => (
            CloudKind::OpenStack {
                auth_url: require(&raw, section, "auth_url")?.to_string(),
                user: require(&raw, section, "os_user")?.to_string(),
                password: require(&raw, section, "os_password")?.to_string(),
                project: require(&raw, section, "os_project")?.to_string(),
                image: require(&raw, section, "image")?.to_string(),
                flavor: require(&raw, section, "flavor")?.to_string(),
                network: optional(&raw, "network").map(str::to_string),
            },
            &["auth_url", "os_user", "os_password", "os_project", "image", "flavor", "network"],
        ),
        "script" => (
            CloudKind::Script {
                create_cmd: require(&raw, section, "create_cmd")?.to_string(),
                delete_cmd: require(&raw, section, "delete_cmd")?.to_string(),
                list_cmd: require(&raw, section, "list_cmd")?.to_string(),
            },
            &["create_cmd", "delete_cmd", "list_cmd"],
        ),
        other => return Err(ConfigError::InvalidCloudKind(name.to_string(), other.to_string())),
    };

    let mut known: Vec<&str> =
        vec!["kind", "max_nodes", "priority", "idle_tolerance", "ssh_user", "jump_user", "jump_host"];
    known.extend_from_slice(known_extra);
    mark_unknown(section, &raw, &known, unknown_keys);

    let max_nodes: u32 = optional(&raw, "max_nodes").unwrap_or("0").parse().map_err(|_| {
        ConfigError::InvalidValue {
            section: section.to_string(),
            key: "max_nodes".to_string(),
            message: "not an integer".to_string(),
        }
    })?;
    let priority: i32 = optional(&raw, "priority").unwrap_or("0").parse().map_err(|_| {
        ConfigError::InvalidValue {
            section: section.to_string(),
            key: "priority".to_string(),
            message: "not an integer".to_string(),
        }
    })?;
    let idle_tolerance_secs: u64 =
        optional(&raw, "idle_tolerance").unwrap_or("300").parse().map_err(|_| ConfigError::InvalidValue {
            section: section.to_string(),
            key: "idle_tolerance".to_string(),
            message: "not an integer number of seconds".to_string(),
        })?;

    let jump_host = match (optional(&raw, "jump_user"), optional(&raw, "jump_host")) {
        (Some(user), Some(host)) => Some(JumpHost { user: user.to_string(), host: host.to_string() }),
        (None, None) => None,
        _ => {
            return Err(ConfigError::InvalidValue {
                section: section.to_string(),
                key: "jump_host".to_string(),
                message: "jump_user and jump_host must be set together".to_string(),
            })
        }
    };

    Ok(CloudConfig {
        name: name.to_string(),
        kind,
        max_nodes,
        priority,
        idle_tolerance: Duration::from_secs(idle_tolerance_secs),
        ssh_user: optional(&raw, "ssh_user").unwrap_or("root").to_string(),
        jump_host,
    })
}

fn parse_engines(
    ini: &Ini,
    unknown_keys: &mut Vec<UnknownKey>,
) -> Result<HashMap<String, EngineDef>, ConfigError> {
    let mut engines = HashMap::new();
    for section_name in ini.sections().flatten() {
        let Some(name) = section_name.strip_prefix("engine.") else { continue };
        engines.insert(name.to_string(), parse_one_engine(ini, section_name, name, unknown_keys)?);
    }
    Ok(engines)
}

fn parse_one_engine(
    ini: &Ini,
    section: &str,
    name: &str,
    unknown_keys: &mut Vec<UnknownKey>,
) -> Result<EngineDef, ConfigError> {
    let raw = interpolated_section(ini, section);
    let known = [
        "platforms",
        "platform_packages",
        "deploy_local_files",
        "deploy_local_archive",
        "deploy_remote_archive",
        "spawn",
        "check_pname",
        "check_cmd",
        "check_cmd_code",
        "sleep_interval",
        "input_files",
        "output_files",
    ];
    mark_unknown(section, &raw, &known, unknown_keys);

    let platforms = parse_list(require(&raw, section, "platforms")?).into_iter().collect();
    let platform_packages =
        optional(&raw, "platform_packages").map(parse_list).unwrap_or_default();

    let deploy_sources = [
        optional(&raw, "deploy_local_files"),
        optional(&raw, "deploy_local_archive"),
        optional(&raw, "deploy_remote_archive"),
    ];
    let deploy = match deploy_sources {
        [Some(files), None, None] => DeploySource::LocalFiles { files: parse_list(files) },
        [None, Some(archive), None] => DeploySource::LocalArchive { archive: archive.to_string() },
        [None, None, Some(url)] => DeploySource::RemoteArchive { url: url.to_string() },
        _ => return Err(ConfigError::AmbiguousDeploySource(name.to_string())),
    };

    let check = match (optional(&raw, "check_pname"), optional(&raw, "check_cmd")) {
        (Some(pname), None) => LivenessCheck::ProcessName { pname: pname.to_string() },
        (None, Some(command)) => {
            let expected_code: i32 = optional(&raw, "check_cmd_code").unwrap_or("0").parse().map_err(
                |_| ConfigError::InvalidValue {
                    section: section.to_string(),
                    key: "check_cmd_code".to_string(),
                    message: "not an integer".to_string(),
                },
            )?;
            LivenessCheck::ShellCommand { command: command.to_string(), expected_code }
        }
        _ => return Err(ConfigError::AmbiguousLivenessCheck(name.to_string())),
    };

    let sleep_interval_secs: u64 =
        optional(&raw, "sleep_interval").unwrap_or("10").parse().map_err(|_| ConfigError::InvalidValue {
            section: section.to_string(),
            key: "sleep_interval".to_string(),
            message: "not an integer number of seconds".to_string(),
        })?;

    let input_files = optional(&raw, "input_files").map(parse_list).unwrap_or_default();
    let output_files = optional(&raw, "output_files").map(parse_list).unwrap_or_default();

    EngineDef::new(
        name,
        platforms,
        platform_packages,
        deploy,
        require(&raw, section, "spawn")?.to_string(),
        check,
        Duration::from_secs(sleep_interval_secs),
        input_files,
        output_files,
    )
    .map_err(|e| ConfigError::EngineDef(name.to_string(), e))
}

#[cfg(test)]
#[path = "load_tests.rs"]
mod tests;
