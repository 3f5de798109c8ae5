// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`Reconciler`]: the single scheduler-loop tick of §4.6 — harvest,
//! recover, assign, drain webhooks. Holds no authoritative state of its
//! own; everything survives a restart because the database is the
//! source of truth (§5: "cross-task coordination is via the database").

use crate::error::{Disposition, EngineError};
use crate::webhook::WebhookSender;
use dashmap::DashMap;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::Instrument;
use yascheduler_core::{render_template, BoundedSemaphore, EngineDef, EngineName, NodeIp, Task, TaskStatus};
use yascheduler_remote::{deploy_engine, DeployOutcome, FileTransfer, Machine};
use yascheduler_storage::TaskNodeRepository;

yascheduler_core::define_id! {
    /// Correlates every log line a single `Reconciler::tick` call emits.
    /// Not persisted; exists only for tracing spans.
    pub struct ReconcileTickId("rtik");
}

/// Per-node serialization (§5: "operations are serialized by a per-node
/// mutex"). Keyed by IP rather than by a `Machine` handle so it survives
/// reconnects.
pub type NodeLocks = Arc<DashMap<NodeIp, Arc<AsyncMutex<()>>>>;

pub fn new_node_locks() -> NodeLocks {
    Arc::new(DashMap::new())
}

async fn lock_node(locks: &NodeLocks, ip: NodeIp) -> Arc<AsyncMutex<()>> {
    locks.entry(ip).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
}

/// Where a task's input/output file bytes live on the machine running the
/// daemon, distinct from the remote per-task directory (§6 "Remote
/// layout" only specifies the node side). `yasubmit` writes declared
/// input files here before `submit`; harvest writes downloaded outputs
/// here for `yastatus`/operators to retrieve.
fn local_task_dir(local_tasks_dir: &str, task_id: yascheduler_core::TaskId) -> String {
    format!("{}/{}", local_tasks_dir.trim_end_matches('/'), task_id)
}

pub struct Reconciler<R: TaskNodeRepository> {
    repo: Arc<R>,
    engines: Arc<HashMap<EngineName, EngineDef>>,
    machines: Arc<dyn Fn(NodeIp) -> Option<Arc<dyn Machine>> + Send + Sync>,
    locks: NodeLocks,
    webhook: Arc<WebhookSender>,
    local_engines_dir: String,
    local_tasks_dir: String,
    remote_engines_dir: String,
    remote_tasks_dir: String,
    /// §5 `allocate_limit`/`allocate_pending`: task assignment (shared
    /// with the coordinator's node-creation use of the same family).
    allocate: Arc<BoundedSemaphore>,
    /// §5 `consume_limit`/`consume_pending`: result download.
    consume: Arc<BoundedSemaphore>,
    /// Set once by the daemon after `Recover` (§4.6 step 2) has run;
    /// subsequent ticks skip it.
    recovered: AtomicBool,
}

impl<R: TaskNodeRepository> Reconciler<R> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repo: Arc<R>,
        engines: Arc<HashMap<EngineName, EngineDef>>,
        machines: Arc<dyn Fn(NodeIp) -> Option<Arc<dyn Machine>> + Send + Sync>,
        locks: NodeLocks,
        webhook: Arc<WebhookSender>,
        local_engines_dir: String,
        local_tasks_dir: String,
        remote_engines_dir: String,
        remote_tasks_dir: String,
        allocate: Arc<BoundedSemaphore>,
        consume: Arc<BoundedSemaphore>,
    ) -> Self {
        Self {
            repo,
            engines,
            machines,
            locks,
            webhook,
            local_engines_dir,
            local_tasks_dir,
            remote_engines_dir,
            remote_tasks_dir,
            allocate,
            consume,
            recovered: AtomicBool::new(false),
        }
    }

    /// One full tick: harvest, (once) recover, assign, drain webhooks.
    /// Never returns an error — per §7's general rule, "the reconciler
    /// never terminates on a single operation's failure"; every fallible
    /// step logs and continues.
    pub async fn tick(&self) {
        let tick_id = ReconcileTickId::new();
        let span = tracing::info_span!("reconcile_tick", tick_id = %tick_id);
        async {
            if !self.recovered.swap(true, Ordering::SeqCst) {
                self.recover().await;
            }
            self.harvest().await;
            self.assign().await;
        }
        .instrument(span)
        .await
    }

    async fn recover(&self) {
        let running = match self.repo.list_running().await {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::warn!(error = %e, "recover: could not list running tasks");
                return;
            }
        };
        let mut dead_ips = Vec::new();
        for task in &running {
            let Some(raw_ip) = &task.ip else { continue };
            let Ok(ip) = NodeIp::parse(raw_ip) else { continue };
            if (self.machines)(ip).is_none() {
                dead_ips.push(ip);
            }
        }
        if dead_ips.is_empty() {
            return;
        }
        match self.repo.recover_orphans(&dead_ips).await {
            Ok(count) => tracing::info!(count, "recover: reset orphaned running tasks"),
            Err(e) => tracing::warn!(error = %e, "recover: recover_orphans failed"),
        }
    }

    /// Step 1: check liveness of every RUNNING task; on "not alive",
    /// download outputs and mark DONE regardless of download outcome.
    async fn harvest(&self) {
        let running = match self.repo.list_running().await {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::warn!(error = %e, "harvest: could not list running tasks");
                return;
            }
        };
        for task in running {
            self.harvest_one(task).await;
        }
    }

    async fn harvest_one(&self, task: Task) {
        let Some(raw_ip) = task.ip.clone() else { return };
        let Ok(ip) = NodeIp::parse(&raw_ip) else { return };
        let Some(machine) = (self.machines)(ip) else { return };
        let Some(engine) = self.engines.get(&task.metadata.engine) else {
            tracing::warn!(task_id = %task.id, engine = %task.metadata.engine, "harvest: unknown engine");
            return;
        };

        let _guard = lock_node(&self.locks, ip).await.lock_owned().await;
        let alive = match machine.process_alive(&engine.check).await {
            Ok(alive) => alive,
            Err(e) => {
                tracing::warn!(task_id = %task.id, error = %e, "harvest: process_alive check failed, retrying next tick");
                return;
            }
        };
        if alive {
            return;
        }

        let platform = match machine.probe_platform().await {
            Ok(platform) => platform,
            Err(e) => {
                tracing::warn!(task_id = %task.id, error = %e, "harvest: probe_platform failed, retrying next tick");
                return;
            }
        };
        let task_path = yascheduler_remote::join(&self.remote_tasks_dir, &task.id.to_string(), &platform);
        let local_task_path = local_task_dir(&self.local_tasks_dir, task.id);
        let transfers: Vec<FileTransfer> = task
            .metadata
            .output_files
            .iter()
            .map(|f| {
                FileTransfer::new(
                    format!("{local_task_path}/{f}"),
                    yascheduler_remote::join(&task_path, f, &platform),
                )
            })
            .collect();
        let mut errors = Vec::new();
        if !transfers.is_empty() {
            match self.consume.acquire().await {
                Ok(_permit) => match machine.download(&transfers).await {
                    Ok(outcome) => {
                        for (file, message) in outcome.failed {
                            errors.push(yascheduler_core::task::OutputError { file, error: message });
                        }
                    }
                    Err(e) => {
                        for file in &task.metadata.output_files {
                            errors
                                .push(yascheduler_core::task::OutputError { file: file.clone(), error: e.to_string() });
                        }
                    }
                },
                Err(_) => {
                    tracing::warn!(task_id = %task.id, %ip, "harvest: consume queue full, retrying next tick");
                    return;
                }
            }
        }

        let mut metadata = task.metadata.clone();
        let webhook_url = metadata.webhook_url.clone();
        metadata.errors = if errors.is_empty() { None } else { Some(errors) };
        if let Err(e) = self.repo.finish(task.id, Some(metadata)).await {
            tracing::warn!(task_id = %task.id, error = %e, "harvest: finish failed, retrying next tick");
            return;
        }
        tracing::info!(task_id = %task.id, "task finished");
        if let Some(url) = webhook_url {
            self.webhook.enqueue(url, task.id, task.label.clone(), TaskStatus::Done).await;
        }
    }

    /// Step 3: claim ready tasks against free nodes, per engine, deploy
    /// if needed, upload inputs, spawn detached.
    async fn assign(&self) {
        let free_nodes = match self.repo.list_free_nodes().await {
            Ok(nodes) => nodes,
            Err(e) => {
                tracing::warn!(error = %e, "assign: could not list free nodes");
                return;
            }
        };
        if free_nodes.is_empty() {
            return;
        }
        let mut by_ip: HashMap<NodeIp, yascheduler_core::Node> = HashMap::new();
        for node in free_nodes {
            if node.enabled {
                by_ip.insert(node.ip, node);
            }
        }

        // Node platform isn't a stored column (§3); probe each free node
        // once per tick so every engine's candidate set can be filtered
        // to nodes whose platform it actually supports (§4.1 "nodes
        // whose platforms cover the task's engine", S2).
        let mut platforms: HashMap<NodeIp, String> = HashMap::new();
        for ip in by_ip.keys().copied() {
            let Some(machine) = (self.machines)(ip) else { continue };
            match machine.probe_platform().await {
                Ok(platform) => {
                    platforms.insert(ip, platform);
                }
                Err(e) => {
                    tracing::warn!(%ip, error = %e, "assign: probe_platform failed, excluding node this tick");
                }
            }
        }

        for (engine_name, engine) in self.engines.iter() {
            let candidate_ips: Vec<NodeIp> = by_ip
                .keys()
                .copied()
                .filter(|ip| platforms.get(ip).is_some_and(|p| engine.supports_platform(p)))
                .collect();
            if candidate_ips.is_empty() {
                continue;
            }
            let claimed = match self.repo.claim_ready_tasks(&candidate_ips, engine_name).await {
                Ok(pairs) => pairs,
                Err(e) => {
                    tracing::warn!(error = %e, engine = %engine_name, "assign: claim_ready_tasks failed");
                    continue;
                }
            };
            for (task, ip) in claimed {
                let Some(node) = by_ip.remove(&ip) else { continue };
                self.dispatch_one(task, node).await;
            }
        }
    }

    async fn dispatch_one(&self, task: Task, node: yascheduler_core::Node) {
        let ip = node.ip;
        let Some(engine) = self.engines.get(&task.metadata.engine).cloned() else {
            tracing::warn!(task_id = %task.id, "dispatch: unknown engine, leaving task RUNNING for recovery");
            return;
        };
        let Some(machine) = (self.machines)(ip) else {
            tracing::warn!(task_id = %task.id, %ip, "dispatch: no machine handle for claimed node");
            return;
        };
        let Ok(_permit) = self.allocate.acquire().await else {
            tracing::warn!(task_id = %task.id, %ip, "dispatch: allocate queue full, retrying next tick");
            return;
        };

        let _guard = lock_node(&self.locks, ip).await.lock_owned().await;

        let outcome = match deploy_engine(
            machine.as_ref(),
            &ip.to_string(),
            &engine,
            &self.local_engines_dir,
            &self.remote_engines_dir,
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                // §7: SSHAuthPermanent/EngineDeployFailed disable the node
                // (cloud deallocation, if any, is the coordinator's job on
                // its next scale-down pass); a transient connect failure
                // just retries next tick.
                match EngineError::from(e).disposition() {
                    Disposition::Retry => {
                        tracing::warn!(task_id = %task.id, %ip, "dispatch: deploy failed transiently, retrying next tick");
                    }
                    _ => {
                        tracing::warn!(task_id = %task.id, %ip, "dispatch: deploy failed, disabling node");
                        let _ = self.repo.set_node_enabled(ip, false).await;
                    }
                }
                return;
            }
        };
        if outcome == DeployOutcome::UnsupportedPlatform {
            tracing::warn!(task_id = %task.id, %ip, "dispatch: node claimed task but does not support engine platform");
            return;
        }

        let platform = match machine.probe_platform().await {
            Ok(platform) => platform,
            Err(e) => {
                tracing::warn!(task_id = %task.id, %ip, error = %e, "dispatch: probe_platform failed, retrying next tick");
                return;
            }
        };
        let task_path = yascheduler_remote::join(&self.remote_tasks_dir, &task.id.to_string(), &platform);
        let local_task_path = local_task_dir(&self.local_tasks_dir, task.id);
        let transfers: Vec<FileTransfer> = task
            .metadata
            .input_files
            .iter()
            .map(|f| {
                FileTransfer::new(
                    format!("{local_task_path}/{f}"),
                    yascheduler_remote::join(&task_path, f, &platform),
                )
            })
            .collect();
        if let Err(e) = machine.upload(&transfers).await {
            tracing::warn!(task_id = %task.id, %ip, error = %e, "dispatch: input upload failed, retrying next tick");
            return;
        }

        let ncpus = task.metadata.ncpus.or(node.ncpus).unwrap_or(1);
        let engine_path = yascheduler_remote::join(&self.remote_engines_dir, &engine.name, &platform);
        let mut values = BTreeMap::new();
        values.insert("task_path", task_path.clone());
        values.insert("engine_path", engine_path);
        values.insert("ncpus", ncpus.to_string());
        let command = render_template(&engine.spawn, &values);

        if let Err(e) = machine.spawn_detached(&command, &task_path).await {
            tracing::warn!(task_id = %task.id, %ip, error = %e, "dispatch: spawn failed, retrying next tick");
        } else {
            tracing::info!(task_id = %task.id, %ip, engine = %engine.name, "task dispatched");
        }
    }

    pub fn engines(&self) -> &HashMap<EngineName, EngineDef> {
        &self.engines
    }
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
