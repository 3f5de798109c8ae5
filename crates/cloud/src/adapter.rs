// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`CloudAdapter`]: the provider-driver contract of §4.4. One instance
//! is bound to one configured `cloud.<name>` provider; the coordinator
//! in `crates/engine` holds one adapter per enabled provider.

use crate::error::CloudError;
use async_trait::async_trait;
use yascheduler_core::NodeIp;

#[async_trait]
pub trait CloudAdapter: Send + Sync {
    /// The `cloud.<name>` this adapter was configured for, used to
    /// attribute errors and cool-offs (§4.5).
    fn name(&self) -> &str;

    /// Provision one node. Returns only once the node reports SSH
    /// readiness or the provider's creation timeout elapses — on
    /// timeout, implementations must delete the partially created node
    /// before returning [`CloudError::ReadinessTimeout`] (§4.4).
    async fn create_node(&self) -> Result<NodeIp, CloudError>;

    async fn delete_node(&self, ip: &NodeIp) -> Result<(), CloudError>;

    async fn list_nodes(&self) -> Result<Vec<NodeIp>, CloudError>;
}
