// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node: a remote machine, static or cloud-leased, eligible to run tasks.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// A validated node IP address. The DB column is `VARCHAR(15)` (dotted IPv4),
/// so construction rejects anything that doesn't parse as an IPv4 address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeIp(IpAddr);

impl NodeIp {
    pub fn parse(s: &str) -> Result<Self, std::net::AddrParseError> {
        s.parse::<std::net::Ipv4Addr>().map(|v4| Self(IpAddr::V4(v4)))
    }
}

impl std::fmt::Display for NodeIp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for NodeIp {
    type Error = std::net::AddrParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NodeIp> for String {
    fn from(ip: NodeIp) -> Self {
        ip.to_string()
    }
}

/// Node registry row. The lifecycle described in §3 (CREATED →
/// PROVISIONING → ACTIVE → DRAINING → DELETED) is derived, not stored:
/// there is no lifecycle column. Callers infer it from `enabled` plus
/// whether the node currently backs a RUNNING task (tracked in
/// `yascheduler-storage`, not here).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub ip: NodeIp,
    pub ncpus: Option<u16>,
    pub enabled: bool,
    /// `None` for statically registered nodes; `Some(provider_name)` for
    /// cloud-leased ones.
    pub cloud: Option<String>,
    pub username: String,
}

impl Node {
    pub fn new_static(ip: NodeIp, username: impl Into<String>) -> Self {
        Self { ip, ncpus: None, enabled: true, cloud: None, username: username.into() }
    }

    pub fn new_cloud(ip: NodeIp, username: impl Into<String>, cloud: impl Into<String>) -> Self {
        Self {
            ip,
            ncpus: None,
            enabled: true,
            cloud: Some(cloud.into()),
            username: username.into(),
        }
    }

    pub fn is_cloud_owned(&self) -> bool {
        self.cloud.is_some()
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
