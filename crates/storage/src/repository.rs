// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`TaskNodeRepository`]: the narrow persistent operations of §4.1, as a
//! trait so `yascheduler-engine`'s reconciler and coordinator can be
//! exercised against [`crate::fake::FakeRepository`] without a database.

use crate::error::StorageError;
use async_trait::async_trait;
use std::collections::HashSet;
use yascheduler_core::{EngineName, Node, NodeIp, Task, TaskId, TaskMetadata};

#[async_trait]
pub trait TaskNodeRepository: Send + Sync {
    /// Insert a new TO_DO task. Returns the assigned, strictly monotonic id.
    async fn submit(&self, label: &str, metadata: TaskMetadata) -> Result<TaskId, StorageError>;

    /// Atomically pair TO_DO tasks of `engine` with nodes drawn from
    /// `candidate_ips` (the caller's own platform-filtered free-node set,
    /// per §4.1), FIFO by task id, lowest IP first, flipping status to
    /// RUNNING. Uses row-level locking so concurrent reconciler instances
    /// never double-assign (§4.1, §8 property 4).
    async fn claim_ready_tasks(
        &self,
        candidate_ips: &[NodeIp],
        engine: &EngineName,
    ) -> Result<Vec<(Task, NodeIp)>, StorageError>;

    async fn list_running(&self) -> Result<Vec<Task>, StorageError>;

    /// Count of TO_DO tasks fleet-wide, used by the cloud coordinator's
    /// scale-up decision (§4.5). Deliberately a count, not a list: the
    /// coordinator never looks at task identity, only pressure.
    async fn count_todo_tasks(&self) -> Result<u32, StorageError>;

    async fn list_free_nodes(&self) -> Result<Vec<Node>, StorageError>;

    async fn list_busy_ips(&self) -> Result<HashSet<NodeIp>, StorageError>;

    /// Mark a task DONE, optionally replacing its metadata (used to attach
    /// the per-file download-error list, §4.6 step 1).
    async fn finish(
        &self,
        task_id: TaskId,
        metadata: Option<TaskMetadata>,
    ) -> Result<(), StorageError>;

    /// Reset RUNNING→TO_DO and clear `ip` for every task assigned to one of
    /// `dead_ips`. Idempotent; returns the number of recovered tasks (§4.1,
    /// §8 property 2).
    async fn recover_orphans(&self, dead_ips: &[NodeIp]) -> Result<usize, StorageError>;

    async fn register_node(&self, node: Node) -> Result<(), StorageError>;

    async fn set_node_enabled(&self, ip: NodeIp, enabled: bool) -> Result<(), StorageError>;

    async fn set_node_ncpus(&self, ip: NodeIp, ncpus: u16) -> Result<(), StorageError>;

    async fn delete_node(&self, ip: NodeIp) -> Result<(), StorageError>;

    async fn get_node(&self, ip: NodeIp) -> Result<Option<Node>, StorageError>;

    async fn list_nodes(&self) -> Result<Vec<Node>, StorageError>;

    async fn list_cloud_nodes(&self, cloud: &str) -> Result<Vec<Node>, StorageError>;
}
