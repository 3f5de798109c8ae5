// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine deployment, §4.3: "copy or fetch the engine's files onto a
//! node, install platform packages, once per node per engine." Every
//! step here is idempotent so a daemon restart mid-deploy just redoes
//! cheap existence checks rather than corrupting remote state.

use crate::error::RemoteError;
use crate::machine::{FileTransfer, Machine};
use yascheduler_core::{DeploySource, EngineDef};

/// Outcome of attempting to deploy one engine to one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    /// The engine is present and ready to spawn.
    Ready,
    /// §4.3: "unsupported platforms for a given engine cause the deployer
    /// to skip that engine on that node, not fail the node setup." Not an
    /// error: the caller simply excludes this `(node, engine)` pair from
    /// scheduling.
    UnsupportedPlatform,
}

/// `engines_dir` is the remote directory engines are deployed under
/// (`[remote] engines_dir`, §6); `local_engines_dir` is where
/// `LocalFiles`/`LocalArchive` sources are read from on the machine
/// running the daemon (`[local] engines_dir`).
pub async fn deploy_engine(
    machine: &dyn Machine,
    ip: &str,
    engine: &EngineDef,
    local_engines_dir: &str,
    remote_engines_dir: &str,
) -> Result<DeployOutcome, RemoteError> {
    let platform = machine.probe_platform().await?;
    if !engine.supports_platform(&platform) {
        return Ok(DeployOutcome::UnsupportedPlatform);
    }

    let engine_path = crate::paths::join(remote_engines_dir, &engine.name, &platform);
    if machine.path_exists(&engine_path).await? {
        return Ok(DeployOutcome::Ready);
    }

    let marker = crate::paths::join(&engine_path, ".deployed", &platform);
    let mkdir = machine.exec(&mkdir_command(&engine_path, &platform)).await?;
    if !mkdir.success() {
        return Err(RemoteError::DeployFailed {
            ip: ip.to_string(),
            engine: engine.name.clone(),
            message: format!("mkdir {engine_path} failed: {}", mkdir.stderr),
        });
    }

    match &engine.deploy {
        DeploySource::LocalFiles { files } => {
            let transfers: Vec<FileTransfer> = files
                .iter()
                .map(|f| {
                    let local = crate::paths::join(local_engines_dir, f, "linux");
                    let remote = crate::paths::join(&engine_path, f, &platform);
                    FileTransfer::new(local, remote)
                })
                .collect();
            let outcome = machine.upload(&transfers).await?;
            if !outcome.all_ok() {
                return Err(RemoteError::DeployFailed {
                    ip: ip.to_string(),
                    engine: engine.name.clone(),
                    message: format!("upload failures: {:?}", outcome.failed),
                });
            }
        }
        DeploySource::LocalArchive { archive } => {
            let local = crate::paths::join(local_engines_dir, archive, "linux");
            let remote_archive = crate::paths::join(&engine_path, archive, &platform);
            let outcome = machine.upload(&[FileTransfer::new(local, remote_archive.clone())]).await?;
            if !outcome.all_ok() {
                return Err(RemoteError::DeployFailed {
                    ip: ip.to_string(),
                    engine: engine.name.clone(),
                    message: format!("archive upload failed: {:?}", outcome.failed),
                });
            }
            extract_and_clean(machine, ip, &remote_archive, &engine_path, &platform, &engine.name).await?;
        }
        DeploySource::RemoteArchive { url } => {
            let remote_archive = crate::paths::join(&engine_path, "engine.archive", &platform);
            let fetch = machine.exec(&fetch_command(url, &remote_archive)).await?;
            if !fetch.success() {
                return Err(RemoteError::DeployFailed {
                    ip: ip.to_string(),
                    engine: engine.name.clone(),
                    message: format!("fetch {url} failed: {}", fetch.stderr),
                });
            }
            extract_and_clean(machine, ip, &remote_archive, &engine_path, &platform, &engine.name).await?;
        }
    }

    if !engine.platform_packages.is_empty() {
        machine.install_packages(&engine.platform_packages, &platform).await?;
    }

    // Marker write is best-effort: a missing marker only costs a redundant
    // `path_exists` check on the next tick, never incorrect behavior, so a
    // failure here does not fail the deploy.
    let _ = machine.exec(&format!("touch '{marker}'")).await;

    Ok(DeployOutcome::Ready)
}

fn mkdir_command(path: &str, platform: &str) -> String {
    if crate::paths::is_windows(platform) {
        format!("cmd /c mkdir \"{path}\"")
    } else {
        format!("mkdir -p '{path}'")
    }
}

fn fetch_command(url: &str, dest: &str) -> String {
    format!("curl -fsSL '{url}' -o '{dest}'")
}

async fn extract_and_clean(
    machine: &dyn Machine,
    ip: &str,
    archive: &str,
    dest: &str,
    platform: &str,
    engine_name: &str,
) -> Result<(), RemoteError> {
    let extract = if archive.ends_with(".zip") {
        format!("unzip -o '{archive}' -d '{dest}'")
    } else {
        format!("tar -xf '{archive}' -C '{dest}'")
    };
    let out = machine.exec(&extract).await?;
    if !out.success() {
        return Err(RemoteError::DeployFailed {
            ip: ip.to_string(),
            engine: engine_name.to_string(),
            message: format!("extract {archive} failed: {}", out.stderr),
        });
    }
    let _ = machine.exec(&rm_command(archive, platform)).await;
    Ok(())
}

fn rm_command(path: &str, platform: &str) -> String {
    if crate::paths::is_windows(platform) {
        format!("cmd /c del /f \"{path}\"")
    } else {
        format!("rm -f '{path}'")
    }
}

#[cfg(test)]
#[path = "deploy_tests.rs"]
mod tests;
