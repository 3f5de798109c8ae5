// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`FakeAdapter`]: an in-memory [`CloudAdapter`] so `yascheduler-engine`'s
//! coordinator (scale-up/scale-down, priority ordering, cool-off) is
//! unit-testable without a cloud account, mirroring
//! `yascheduler-storage`'s `FakeRepository`.

use crate::adapter::CloudAdapter;
use crate::error::CloudError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use yascheduler_core::NodeIp;

pub struct FakeAdapter {
    name: String,
    nodes: Mutex<Vec<NodeIp>>,
    next_octet: AtomicU32,
    pub fail_create: Mutex<bool>,
    pub fail_delete: Mutex<bool>,
}

impl FakeAdapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Mutex::new(Vec::new()),
            next_octet: AtomicU32::new(1),
            fail_create: Mutex::new(false),
            fail_delete: Mutex::new(false),
        }
    }

    pub fn active_count(&self) -> usize {
        self.nodes.lock().len()
    }
}

#[async_trait]
impl CloudAdapter for FakeAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn create_node(&self) -> Result<NodeIp, CloudError> {
        if *self.fail_create.lock() {
            return Err(CloudError::ApiError { provider: self.name.clone(), message: "simulated failure".into() });
        }
        let octet = self.next_octet.fetch_add(1, Ordering::SeqCst);
        let ip = NodeIp::parse(&format!("10.1.{}.{}", octet / 256, octet % 256)).expect("valid synthetic ip");
        self.nodes.lock().push(ip);
        Ok(ip)
    }

    async fn delete_node(&self, ip: &NodeIp) -> Result<(), CloudError> {
        if *self.fail_delete.lock() {
            return Err(CloudError::ApiError { provider: self.name.clone(), message: "simulated failure".into() });
        }
        self.nodes.lock().retain(|n| n != ip);
        Ok(())
    }

    async fn list_nodes(&self) -> Result<Vec<NodeIp>, CloudError> {
        Ok(self.nodes.lock().clone())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
