// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ScriptAdapter`: shells out to operator-provided create/delete/list
//! commands (§4.4), for providers without a native driver. Each command
//! is run through `sh -c` and is expected to print exactly one thing on
//! stdout: `create` prints the new node's IP, `list` prints one IP per
//! line; `delete` is invoked as `<delete_cmd> <ip>` and its exit code is
//! the only signal used.

use crate::adapter::CloudAdapter;
use crate::error::CloudError;
use crate::readiness::wait_for_ssh_ready;
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use yascheduler_core::NodeIp;

pub struct ScriptParams {
    pub name: String,
    pub create_cmd: String,
    pub delete_cmd: String,
    pub list_cmd: String,
    pub creation_timeout: Duration,
    pub poll_interval: Duration,
}

pub struct ScriptAdapter {
    params: ScriptParams,
}

impl ScriptAdapter {
    pub fn new(params: ScriptParams) -> Self {
        Self { params }
    }

    fn api_error(&self, message: impl Into<String>) -> CloudError {
        CloudError::ApiError { provider: self.params.name.clone(), message: message.into() }
    }

    async fn run(&self, command: &str) -> Result<String, CloudError> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()
            .await
            .map_err(|e| self.api_error(format!("failed to spawn '{command}': {e}")))?;
        if !output.status.success() {
            return Err(self.api_error(format!(
                "'{command}' exited {}: {}",
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl CloudAdapter for ScriptAdapter {
    fn name(&self) -> &str {
        &self.params.name
    }

    async fn create_node(&self) -> Result<NodeIp, CloudError> {
        let raw_ip = self.run(&self.params.create_cmd).await?;
        if !wait_for_ssh_ready(&raw_ip, self.params.creation_timeout, self.params.poll_interval).await {
            let _ = self.run(&format!("{} {raw_ip}", self.params.delete_cmd)).await;
            return Err(CloudError::ReadinessTimeout { provider: self.params.name.clone(), ip: raw_ip });
        }
        NodeIp::parse(&raw_ip).map_err(|e| self.api_error(format!("invalid address '{raw_ip}' from create_cmd: {e}")))
    }

    async fn delete_node(&self, ip: &NodeIp) -> Result<(), CloudError> {
        self.run(&format!("{} {ip}", self.params.delete_cmd)).await?;
        Ok(())
    }

    async fn list_nodes(&self) -> Result<Vec<NodeIp>, CloudError> {
        let out = self.run(&self.params.list_cmd).await?;
        Ok(out.lines().filter_map(|line| NodeIp::parse(line.trim()).ok()).collect())
    }
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod tests;
