// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`MachinePool`]: a cache of live `SshMachine` connections keyed by
//! node IP.
//!
//! [`yascheduler_engine::Reconciler::new`] takes a synchronous
//! `Fn(NodeIp) -> Option<Arc<dyn Machine>>` — a tick has to decide
//! "connected or not" without awaiting a dial mid-tick, since a single
//! SSH handshake stalling would stall the whole tick's node selection.
//! So connecting is a separate, explicit, async step
//! ([`MachinePool::sync`]) run once per tick before `Reconciler::tick`;
//! the closure handed to the reconciler is then a plain cache lookup.
//! A node missing from the cache (never dialed, or the last dial
//! failed) reads as "vanished" to the reconciler, which is exactly the
//! §4.1 orphan-recovery behavior S3 expects.

use dashmap::DashMap;
use std::sync::Arc;
use yascheduler_core::NodeIp;
use yascheduler_remote::{ConnectGovernor, Machine, SshMachine};
use yascheduler_storage::TaskNodeRepository;

pub struct MachinePool {
    connect: ConnectGovernor,
    machines: DashMap<NodeIp, Arc<SshMachine>>,
}

impl MachinePool {
    pub fn new(connect_limit: usize, connect_pending: usize) -> Self {
        Self { connect: ConnectGovernor::new(connect_limit, connect_pending), machines: DashMap::new() }
    }

    /// Synchronous lookup, suitable for `Reconciler::new`'s `machines`
    /// closure parameter.
    pub fn get(&self, ip: NodeIp) -> Option<Arc<dyn Machine>> {
        self.machines.get(&ip).map(|entry| entry.clone() as Arc<dyn Machine>)
    }

    /// Dial every enabled node not already cached, and drop cache entries
    /// for nodes the repository no longer lists (deleted or disabled).
    /// Best-effort: a connect failure just leaves that node absent from
    /// the cache for this tick, logged and retried next time.
    pub async fn sync<R: TaskNodeRepository>(&self, repo: &R) {
        let nodes = match repo.list_nodes().await {
            Ok(nodes) => nodes,
            Err(e) => {
                tracing::warn!(error = %e, "machine pool: could not list nodes");
                return;
            }
        };

        let live: std::collections::HashSet<NodeIp> = nodes.iter().map(|n| n.ip).collect();
        self.machines.retain(|ip, _| live.contains(ip));

        for node in nodes {
            if !node.enabled || self.machines.contains_key(&node.ip) {
                continue;
            }
            match SshMachine::connect(&node.ip.to_string(), &node.username, &self.connect).await {
                Ok(machine) => {
                    tracing::info!(ip = %node.ip, "machine pool: connected");
                    if node.ncpus.is_none() {
                        match machine.probe_cpus().await {
                            Ok(ncpus) => {
                                if let Err(e) = repo.set_node_ncpus(node.ip, ncpus).await {
                                    tracing::warn!(ip = %node.ip, error = %e, "machine pool: persisting probed ncpus failed");
                                }
                            }
                            Err(e) => {
                                tracing::warn!(ip = %node.ip, error = %e, "machine pool: probe_cpus failed");
                            }
                        }
                    }
                    self.machines.insert(node.ip, Arc::new(machine));
                }
                Err(e) => {
                    tracing::warn!(ip = %node.ip, error = %e, "machine pool: connect failed");
                }
            }
        }
    }
}
