// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`SshMachine`]: the concrete [`Machine`] backed by a single `openssh`
//! session, §4.2. One instance owns one multiplexed connection; the
//! daemon keeps a map of these behind `yascheduler-engine`'s per-node
//! mutex, so callers never need to serialize against themselves.

use crate::error::RemoteError;
use crate::machine::{ExecOutput, FileTransfer, Machine, TransferOutcome};
use async_trait::async_trait;
use openssh::{KnownHosts, Session, Stdio};
use openssh_sftp_client::Sftp;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use yascheduler_core::{BoundedSemaphore, LivenessCheck};

/// Governs concurrent SSH connection *establishment* across every
/// [`SshMachine`] in the process — §5's `conn_machine` family. Dialing is
/// the expensive, rate-limited step; once connected a session is held
/// open and reused, so this only gates [`SshMachine::connect`].
pub struct ConnectGovernor(BoundedSemaphore);

impl ConnectGovernor {
    pub fn new(limit: usize, pending_limit: usize) -> Self {
        Self(BoundedSemaphore::new(limit, pending_limit))
    }
}

pub struct SshMachine {
    ip: String,
    session: Session,
    platform: Mutex<Option<String>>,
}

impl SshMachine {
    /// Dial `user@ip`, governed by `connect` so a burst of reconnects
    /// cannot overrun the daemon's own file-descriptor budget.
    pub async fn connect(ip: &str, user: &str, connect: &ConnectGovernor) -> Result<Self, RemoteError> {
        let _permit = connect.0.acquire().await?;
        let dest = format!("{user}@{ip}");
        let session = Session::connect(&dest, KnownHosts::Accept).await.map_err(|e| {
            classify_connect_error(ip, &e)
        })?;
        Ok(Self { ip: ip.to_string(), session, platform: Mutex::new(None) })
    }

    async fn sftp(&self) -> Result<Sftp, RemoteError> {
        Sftp::from_session(self.session.to_owned_unchecked(), Default::default())
            .await
            .map_err(|e| RemoteError::Exec(format!("sftp subsystem failed for {}: {e}", self.ip)))
    }
}

fn classify_connect_error(ip: &str, err: &openssh::Error) -> RemoteError {
    let message = err.to_string();
    if message.contains("Permission denied") || message.contains("authentication") {
        RemoteError::AuthPermanent { ip: ip.to_string(), message }
    } else {
        RemoteError::ConnectTransient { ip: ip.to_string(), message }
    }
}

/// Compose `{ID}-{VERSION_ID}` from `/etc/os-release` lines (§4.2's
/// normalized platform tag, e.g. `debian-11`), matching the shape engine
/// `platforms` sets are declared in. Falls back to a bare `ID`, or
/// `linux`, if a key is missing.
fn linux_tag(os_release: &str) -> String {
    let mut id = None;
    let mut version = None;
    for line in os_release.lines() {
        if let Some(value) = line.strip_prefix("ID=") {
            id = Some(value.trim().trim_matches('"').to_string());
        } else if let Some(value) = line.strip_prefix("VERSION_ID=") {
            version = Some(value.trim().trim_matches('"').to_string());
        }
    }
    match (id, version) {
        (Some(id), Some(version)) if !id.is_empty() && !version.is_empty() => format!("{id}-{version}"),
        (Some(id), _) if !id.is_empty() => id,
        _ => "linux".to_string(),
    }
}

/// `sw_vers -productVersion` prints e.g. `13.4`; keep only the major
/// version (`macos-13`) to match the other platforms' tag granularity.
fn macos_tag(product_version: &str) -> String {
    match product_version.trim().split('.').next() {
        Some(major) if !major.is_empty() => format!("macos-{major}"),
        _ => "macos".to_string(),
    }
}

/// `ver` prints e.g. `Microsoft Windows [Version 10.0.22621.963]`.
/// Windows 11 still reports kernel major/minor `10.0`, so the marketing
/// version has to come from the build number: builds ≥22000 are 11.
fn windows_tag(ver_output: &str) -> String {
    let Some(start) = ver_output.find("Version ") else {
        return "windows".to_string();
    };
    let rest = ver_output[start + "Version ".len()..].trim_end_matches([']', '\r', '\n']);
    let mut parts = rest.split('.');
    let major = parts.next().unwrap_or("");
    let build: Option<u32> = parts.nth(1).and_then(|b| b.parse().ok());
    match (major, build) {
        ("10", Some(build)) if build >= 22000 => "windows-11".to_string(),
        ("10", _) => "windows-10".to_string(),
        (major, _) if !major.is_empty() => format!("windows-{major}"),
        _ => "windows".to_string(),
    }
}

#[async_trait]
impl Machine for SshMachine {
    async fn probe_platform(&self) -> Result<String, RemoteError> {
        if let Some(cached) = self.platform.lock().clone() {
            return Ok(cached);
        }
        // `ver` succeeds only on a cmd.exe shell; any POSIX box falls
        // through to `uname`+release parsing.
        let windows_probe = self.exec("ver").await?;
        let platform = if windows_probe.success() && windows_probe.stdout.to_lowercase().contains("windows") {
            windows_tag(&windows_probe.stdout)
        } else {
            let uname = self.exec("uname -s").await?;
            if uname.stdout.trim().eq_ignore_ascii_case("darwin") {
                let sw_vers = self.exec("sw_vers -productVersion").await?;
                macos_tag(&sw_vers.stdout)
            } else {
                let release = self
                    .exec("cat /etc/os-release 2>/dev/null | grep -E '^(ID|VERSION_ID)='")
                    .await?;
                linux_tag(&release.stdout)
            }
        };
        *self.platform.lock() = Some(platform.clone());
        Ok(platform)
    }

    async fn probe_cpus(&self) -> Result<u16, RemoteError> {
        let out = self.exec("nproc").await?;
        out.stdout
            .trim()
            .parse::<u16>()
            .map_err(|_| RemoteError::Exec(format!("could not parse nproc output: {:?}", out.stdout)))
    }

    async fn path_exists(&self, path: &str) -> Result<bool, RemoteError> {
        let out = self.exec(&format!("test -e '{path}'")).await?;
        Ok(out.success())
    }

    async fn install_packages(&self, packages: &[String], platform: &str) -> Result<(), RemoteError> {
        if packages.is_empty() {
            return Ok(());
        }
        let list = packages.join(" ");
        let command = if crate::paths::is_windows(platform) {
            format!("choco install -y {list}")
        } else if self.path_exists("/usr/bin/apt-get").await? {
            format!("sudo apt-get install -y {list}")
        } else {
            format!("sudo yum install -y {list}")
        };
        let out = self.exec(&command).await?;
        if !out.success() {
            return Err(RemoteError::Exec(format!(
                "package install failed ({}): {}",
                out.exit_code, out.stderr
            )));
        }
        Ok(())
    }

    async fn upload(&self, files: &[FileTransfer]) -> Result<TransferOutcome, RemoteError> {
        let sftp = self.sftp().await?;
        let mut outcome = TransferOutcome::default();
        for file in files {
            let result: std::io::Result<()> = async {
                let data = tokio::fs::read(&file.local).await?;
                let mut remote_file = sftp.create(&file.remote).await.map_err(std::io::Error::other)?;
                remote_file.write_all(&data).await.map_err(std::io::Error::other)?;
                remote_file.close().await.map_err(std::io::Error::other)?;
                Ok(())
            }
            .await;
            match result {
                Ok(()) => outcome.succeeded.push(file.remote.clone()),
                Err(e) => outcome.failed.push((file.remote.clone(), e.to_string())),
            }
        }
        Ok(outcome)
    }

    async fn download(&self, files: &[FileTransfer]) -> Result<TransferOutcome, RemoteError> {
        let sftp = self.sftp().await?;
        let mut outcome = TransferOutcome::default();
        for file in files {
            let result: std::io::Result<()> = async {
                let mut remote_file = sftp.open(&file.remote).await.map_err(std::io::Error::other)?;
                let buf = remote_file.read_all().await.map_err(std::io::Error::other)?;
                remote_file.close().await.map_err(std::io::Error::other)?;
                tokio::fs::write(&file.local, buf).await?;
                Ok(())
            }
            .await;
            match result {
                Ok(()) => outcome.succeeded.push(file.remote.clone()),
                Err(e) => outcome.failed.push((file.remote.clone(), e.to_string())),
            }
        }
        Ok(outcome)
    }

    async fn exec(&self, command: &str) -> Result<ExecOutput, RemoteError> {
        let output = self
            .session
            .command("sh")
            .arg("-c")
            .arg(command)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| RemoteError::Exec(format!("{} on {}: {e}", command, self.ip)))?;
        Ok(ExecOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn spawn_detached(&self, command: &str, cwd: &str) -> Result<(), RemoteError> {
        let wrapped = format!("cd '{cwd}' && nohup sh -c '{command}' > /dev/null 2>&1 < /dev/null & disown");
        let out = self.exec(&wrapped).await?;
        if !out.success() {
            return Err(RemoteError::Exec(format!(
                "failed to launch detached process in {cwd}: {}",
                out.stderr
            )));
        }
        Ok(())
    }

    async fn process_alive(&self, check: &LivenessCheck) -> Result<bool, RemoteError> {
        match check {
            LivenessCheck::ProcessName { pname } => {
                let out = self.exec(&format!("pgrep -f '{pname}'")).await?;
                Ok(out.success())
            }
            LivenessCheck::ShellCommand { command, expected_code } => {
                let out = self.exec(command).await?;
                Ok(out.exit_code == *expected_code)
            }
        }
    }
}

/// Thread-safe handle shared across the reconciler's tasks. `SshMachine`
/// holds a single `openssh::Session`, which is itself safe to use from
/// multiple tasks concurrently (it multiplexes channels), so sharing is
/// just an `Arc`.
pub type SharedMachine = Arc<SshMachine>;

#[cfg(test)]
#[path = "ssh_tests.rs"]
mod tests;
