// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`CloudCoordinator`]: the fleet owner of §4.5 — scale-up to satisfy
//! pending work, scale-down on sustained per-provider idleness. Runs as
//! its own cooperatively scheduled tick alongside [`crate::reconciler`],
//! coordinating only through `yascheduler-storage` (§5).

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use yascheduler_cloud::CloudAdapter;
use yascheduler_core::{BoundedSemaphore, Clock, Node, NodeIp, SystemClock};
use yascheduler_storage::TaskNodeRepository;

/// One configured, enabled provider: its adapter plus the scale-up/down
/// parameters of §4.4/§4.5.
pub struct ProviderConfig {
    pub name: String,
    pub adapter: Arc<dyn CloudAdapter>,
    pub max_nodes: u32,
    pub priority: i32,
    pub idle_tolerance: Duration,
    pub ssh_user: String,
}

struct Bookkeeping {
    /// Instant each cloud-owned node was last observed *not* busy, i.e.
    /// the start of its current idle streak (§3: "Idle time is measured
    /// from the last transition out of RUNNING on that IP"). Absent for
    /// nodes currently busy or never yet observed idle.
    idle_since: HashMap<NodeIp, Instant>,
    /// Providers currently in their post-`CloudAPIError` cool-off,
    /// mapped to when the cool-off ends.
    cooloff_until: HashMap<String, Instant>,
}

pub struct CloudCoordinator<R: TaskNodeRepository, C: Clock = SystemClock> {
    repo: Arc<R>,
    providers: Vec<ProviderConfig>,
    allocate: Arc<BoundedSemaphore>,
    deallocate: Arc<BoundedSemaphore>,
    /// Wall-clock duration a provider is shunned after `CloudAPIError`
    /// (config's `cloud_error_cooloff` ticks, converted once at
    /// construction since the coordinator doesn't otherwise know its own
    /// tick period).
    cooloff: Duration,
    clock: C,
    state: Mutex<Bookkeeping>,
}

impl<R: TaskNodeRepository, C: Clock> CloudCoordinator<R, C> {
    pub fn new(
        repo: Arc<R>,
        providers: Vec<ProviderConfig>,
        allocate: Arc<BoundedSemaphore>,
        deallocate: Arc<BoundedSemaphore>,
        cooloff: Duration,
        clock: C,
    ) -> Self {
        Self {
            repo,
            providers,
            allocate,
            deallocate,
            cooloff,
            clock,
            state: Mutex::new(Bookkeeping { idle_since: HashMap::new(), cooloff_until: HashMap::new() }),
        }
    }

    /// One tick: scale up, then scale down. Never panics or propagates an
    /// error — every fallible step logs and continues, matching the
    /// reconciler's tick contract (§7 general rule).
    pub async fn tick(&self) {
        self.scale_up().await;
        self.scale_down().await;
    }

    /// §4.5 Scale-up. Providers in descending priority (ties broken by
    /// name, per [`yascheduler_config::Config::clouds_by_priority`]'s
    /// convention — callers are expected to pass `providers` already in
    /// that order); `need` is computed fleet-wide rather than per-engine
    /// platform, since platform is a probed, not stored, node attribute
    /// (§3) — see DESIGN.md's Open Question.
    async fn scale_up(&self) {
        let mut need = match self.pending_need().await {
            Some(need) => need,
            None => return,
        };
        if need == 0 {
            return;
        }

        for provider in &self.providers {
            if need == 0 {
                break;
            }
            if self.in_cooloff(&provider.name) {
                tracing::debug!(provider = %provider.name, "scale-up: provider in cool-off, skipping");
                continue;
            }
            let active = match self.repo.list_cloud_nodes(&provider.name).await {
                Ok(nodes) => nodes.len() as u32,
                Err(e) => {
                    tracing::warn!(provider = %provider.name, error = %e, "scale-up: could not list nodes");
                    continue;
                }
            };
            let mut slots = provider.max_nodes.saturating_sub(active);
            while need > 0 && slots > 0 {
                let permit = match self.allocate.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        tracing::warn!(provider = %provider.name, "scale-up: allocate queue full, dropping request");
                        return;
                    }
                };
                match provider.adapter.create_node().await {
                    Ok(ip) => {
                        drop(permit);
                        let node = Node::new_cloud(ip, provider.ssh_user.clone(), provider.name.clone());
                        if let Err(e) = self.repo.register_node(node).await {
                            tracing::warn!(provider = %provider.name, %ip, error = %e, "scale-up: register_node failed");
                        } else {
                            tracing::info!(provider = %provider.name, %ip, "node created");
                        }
                        need -= 1;
                        slots -= 1;
                    }
                    Err(e) => {
                        drop(permit);
                        tracing::warn!(provider = %provider.name, error = %e, "scale-up: create_node failed");
                        self.enter_cooloff(&provider.name);
                        break;
                    }
                }
            }
        }
    }

    /// `count(TO_DO tasks) - count(free nodes)`, clamped at zero.
    async fn pending_need(&self) -> Option<u32> {
        let todo = match self.repo.count_todo_tasks().await {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "scale-up: could not count TO_DO tasks");
                return None;
            }
        };
        let free = match self.repo.list_free_nodes().await {
            Ok(nodes) => nodes.len() as u32,
            Err(e) => {
                tracing::warn!(error = %e, "scale-up: could not list free nodes");
                return None;
            }
        };
        Some(todo.saturating_sub(free))
    }

    fn in_cooloff(&self, provider: &str) -> bool {
        let state = self.state.lock();
        state.cooloff_until.get(provider).is_some_and(|deadline| self.clock.now() < *deadline)
    }

    fn enter_cooloff(&self, provider: &str) {
        self.state.lock().cooloff_until.insert(provider.to_string(), self.clock.now() + self.cooloff);
    }

    /// §4.5 Scale-down: disable, defensively recover, delete, deregister,
    /// throttled by `deallocate`.
    async fn scale_down(&self) {
        let busy = match self.repo.list_busy_ips().await {
            Ok(busy) => busy,
            Err(e) => {
                tracing::warn!(error = %e, "scale-down: could not list busy ips");
                return;
            }
        };

        for provider in &self.providers {
            let nodes = match self.repo.list_cloud_nodes(&provider.name).await {
                Ok(nodes) => nodes,
                Err(e) => {
                    tracing::warn!(provider = %provider.name, error = %e, "scale-down: could not list nodes");
                    continue;
                }
            };
            for node in nodes {
                if busy.contains(&node.ip) {
                    self.state.lock().idle_since.remove(&node.ip);
                    continue;
                }
                if !node.enabled {
                    // §7 "Disable node; if cloud-owned, deallocate": a
                    // disabled node (e.g. the reconciler gave up on it
                    // after a deploy/auth failure) is reclaimed right
                    // away, bypassing idle_tolerance entirely.
                    self.state.lock().idle_since.remove(&node.ip);
                    self.deallocate_one(provider, node).await;
                    continue;
                }
                let since = *self
                    .state
                    .lock()
                    .idle_since
                    .entry(node.ip)
                    .or_insert_with(|| self.clock.now());
                if self.clock.now().duration_since(since) < provider.idle_tolerance {
                    continue;
                }
                self.deallocate_one(provider, node).await;
            }
        }
    }

    async fn deallocate_one(&self, provider: &ProviderConfig, node: Node) {
        let ip = node.ip;
        let permit = match self.deallocate.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                tracing::warn!(provider = %provider.name, %ip, "scale-down: deallocate queue full, dropping request");
                return;
            }
        };
        if let Err(e) = self.repo.set_node_enabled(ip, false).await {
            tracing::warn!(provider = %provider.name, %ip, error = %e, "scale-down: disable failed, retrying next tick");
            return;
        }
        // Defensive: guards against a task having claimed this node in
        // the gap between the busy-ips snapshot above and this point.
        let _ = self.repo.recover_orphans(&[ip]).await;
        if let Err(e) = provider.adapter.delete_node(&ip).await {
            tracing::warn!(provider = %provider.name, %ip, error = %e, "scale-down: delete_node failed");
            self.enter_cooloff(&provider.name);
            drop(permit);
            return;
        }
        drop(permit);
        if let Err(e) = self.repo.delete_node(ip).await {
            tracing::warn!(provider = %provider.name, %ip, error = %e, "scale-down: delete_node row cleanup failed");
        }
        self.state.lock().idle_since.remove(&ip);
        tracing::info!(provider = %provider.name, %ip, "node deallocated after idle_tolerance");
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
