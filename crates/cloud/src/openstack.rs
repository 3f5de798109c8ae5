// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `OpenStackAdapter`: talks to an OpenStack-compatible Compute API over
//! its HTTP REST interface (§4.4). Authentication, server creation and
//! floating-IP assignment are intentionally minimal here — enough shape
//! to exercise the `CloudAdapter` contract end to end against a real
//! deployment, not a full Nova client.

use crate::adapter::CloudAdapter;
use crate::error::CloudError;
use crate::readiness::wait_for_ssh_ready;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use yascheduler_core::NodeIp;

pub struct OpenStackParams {
    pub name: String,
    pub auth_url: String,
    pub user: String,
    pub password: String,
    pub project: String,
    pub image: String,
    pub flavor: String,
    pub network: Option<String>,
    pub creation_timeout: Duration,
    pub poll_interval: Duration,
}

pub struct OpenStackAdapter {
    params: OpenStackParams,
    client: reqwest::Client,
}

impl OpenStackAdapter {
    pub fn new(params: OpenStackParams) -> Self {
        Self { params, client: reqwest::Client::new() }
    }

    fn api_error(&self, message: impl Into<String>) -> CloudError {
        CloudError::ApiError { provider: self.params.name.clone(), message: message.into() }
    }

    async fn authenticate(&self) -> Result<String, CloudError> {
        let body = json!({
            "auth": {
                "identity": {
                    "methods": ["password"],
                    "password": {
                        "user": { "name": self.params.user, "password": self.params.password }
                    }
                },
                "scope": { "project": { "name": self.params.project } }
            }
        });
        let response = self
            .client
            .post(format!("{}/auth/tokens", self.params.auth_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.api_error(format!("auth request failed: {e}")))?;
        let token = response
            .headers()
            .get("X-Subject-Token")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| self.api_error("auth response missing X-Subject-Token"))?
            .to_string();
        Ok(token)
    }
}

#[derive(Debug, Deserialize)]
struct ServerCreated {
    server: ServerRef,
}

#[derive(Debug, Deserialize)]
struct ServerRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ServerDetail {
    server: ServerBody,
}

#[derive(Debug, Deserialize)]
struct ServerBody {
    addresses: std::collections::HashMap<String, Vec<ServerAddress>>,
}

#[derive(Debug, Deserialize)]
struct ServerAddress {
    addr: String,
}

#[async_trait]
impl CloudAdapter for OpenStackAdapter {
    fn name(&self) -> &str {
        &self.params.name
    }

    async fn create_node(&self) -> Result<NodeIp, CloudError> {
        let token = self.authenticate().await?;
        let mut server = json!({
            "name": format!("yascheduler-{}", yascheduler_core::short(&self.params.name, 6)),
            "imageRef": self.params.image,
            "flavorRef": self.params.flavor,
        });
        if let Some(network) = &self.params.network {
            server["networks"] = json!([{ "uuid": network }]);
        }
        let created: ServerCreated = self
            .client
            .post(format!("{}/servers", self.params.auth_url))
            .header("X-Auth-Token", &token)
            .json(&json!({ "server": server }))
            .send()
            .await
            .map_err(|e| self.api_error(format!("create server failed: {e}")))?
            .json()
            .await
            .map_err(|e| self.api_error(format!("create server response malformed: {e}")))?;

        let detail: ServerDetail = self
            .client
            .get(format!("{}/servers/{}", self.params.auth_url, created.server.id))
            .header("X-Auth-Token", &token)
            .send()
            .await
            .map_err(|e| self.api_error(format!("fetch server detail failed: {e}")))?
            .json()
            .await
            .map_err(|e| self.api_error(format!("server detail response malformed: {e}")))?;

        let raw_ip = detail
            .server
            .addresses
            .values()
            .flatten()
            .map(|a| a.addr.clone())
            .next()
            .ok_or_else(|| self.api_error("created server has no address yet"))?;

        if !wait_for_ssh_ready(&raw_ip, self.params.creation_timeout, self.params.poll_interval).await {
            let _ = self
                .client
                .delete(format!("{}/servers/{}", self.params.auth_url, created.server.id))
                .header("X-Auth-Token", &token)
                .send()
                .await;
            return Err(CloudError::ReadinessTimeout { provider: self.params.name.clone(), ip: raw_ip });
        }

        NodeIp::parse(&raw_ip).map_err(|e| self.api_error(format!("invalid server address '{raw_ip}': {e}")))
    }

    async fn delete_node(&self, ip: &NodeIp) -> Result<(), CloudError> {
        let token = self.authenticate().await?;
        let server_id = self.find_server_id(&token, ip).await?;
        self.client
            .delete(format!("{}/servers/{}", self.params.auth_url, server_id))
            .header("X-Auth-Token", &token)
            .send()
            .await
            .map_err(|e| self.api_error(format!("delete server failed: {e}")))?;
        Ok(())
    }

    async fn list_nodes(&self) -> Result<Vec<NodeIp>, CloudError> {
        let token = self.authenticate().await?;
        let response: serde_json::Value = self
            .client
            .get(format!("{}/servers/detail", self.params.auth_url))
            .header("X-Auth-Token", &token)
            .send()
            .await
            .map_err(|e| self.api_error(format!("list servers failed: {e}")))?
            .json()
            .await
            .map_err(|e| self.api_error(format!("list servers response malformed: {e}")))?;
        let ips = response["servers"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|s| s["addresses"].as_object())
            .flat_map(|addrs| addrs.values())
            .filter_map(|v| v.as_array())
            .flatten()
            .filter_map(|a| a["addr"].as_str())
            .filter_map(|addr| NodeIp::parse(addr).ok())
            .collect();
        Ok(ips)
    }
}

impl OpenStackAdapter {
    async fn find_server_id(&self, token: &str, ip: &NodeIp) -> Result<String, CloudError> {
        let response: serde_json::Value = self
            .client
            .get(format!("{}/servers/detail", self.params.auth_url))
            .header("X-Auth-Token", token)
            .send()
            .await
            .map_err(|e| self.api_error(format!("list servers failed: {e}")))?
            .json()
            .await
            .map_err(|e| self.api_error(format!("list servers response malformed: {e}")))?;
        let needle = ip.to_string();
        response["servers"]
            .as_array()
            .into_iter()
            .flatten()
            .find(|s| {
                s["addresses"]
                    .as_object()
                    .into_iter()
                    .flat_map(|addrs| addrs.values())
                    .filter_map(|v| v.as_array())
                    .flatten()
                    .any(|a| a["addr"].as_str() == Some(needle.as_str()))
            })
            .and_then(|s| s["id"].as_str())
            .map(str::to_string)
            .ok_or_else(|| self.api_error(format!("no server found for {ip}")))
    }
}
