// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory [`TaskNodeRepository`] for tests, gated behind
//! `feature = "test-support"` so it never ships in a production build —
//! the same scoping convention used elsewhere in this workspace.

use crate::error::StorageError;
use crate::repository::TaskNodeRepository;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use yascheduler_core::{EngineName, Node, NodeIp, Task, TaskId, TaskMetadata, TaskStatus};

#[derive(Default)]
struct Inner {
    tasks: Vec<Task>,
    nodes: Vec<Node>,
    next_task_id: i64,
}

/// Single-process, lock-protected stand-in for the real Postgres
/// repository. Preserves `claim_ready_tasks`' FIFO-by-id, lowest-IP-first
/// pairing contract so `yascheduler-engine`'s reconciler tests exercise the
/// same semantics a real database would enforce.
pub struct FakeRepository {
    inner: Mutex<Inner>,
}

impl Default for FakeRepository {
    fn default() -> Self {
        Self { inner: Mutex::new(Inner { tasks: Vec::new(), nodes: Vec::new(), next_task_id: 1 }) }
    }
}

impl FakeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskNodeRepository for FakeRepository {
    async fn submit(&self, label: &str, metadata: TaskMetadata) -> Result<TaskId, StorageError> {
        let mut inner = self.inner.lock();
        let id = TaskId::new(inner.next_task_id);
        inner.next_task_id += 1;
        inner.tasks.push(Task { id, label: label.to_string(), metadata, ip: None, status: TaskStatus::ToDo });
        Ok(id)
    }

    async fn claim_ready_tasks(
        &self,
        candidate_ips: &[NodeIp],
        engine: &EngineName,
    ) -> Result<Vec<(Task, NodeIp)>, StorageError> {
        let mut inner = self.inner.lock();

        let mut free_ips: Vec<NodeIp> = candidate_ips
            .iter()
            .copied()
            .filter(|ip| inner.nodes.iter().any(|n| n.ip == *ip && n.enabled))
            .collect();
        free_ips.sort();

        let mut todo_ids: Vec<TaskId> = inner
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::ToDo && &t.metadata.engine == engine)
            .map(|t| t.id)
            .collect();
        todo_ids.sort();

        let pairs: Vec<(TaskId, NodeIp)> = todo_ids.into_iter().zip(free_ips).collect();

        let mut claimed = Vec::with_capacity(pairs.len());
        for (task_id, ip) in pairs {
            let task = inner.tasks.iter_mut().find(|t| t.id == task_id).expect("just selected");
            task.status = TaskStatus::Running;
            task.ip = Some(ip.to_string());
            claimed.push((task.clone(), ip));
        }
        Ok(claimed)
    }

    async fn list_running(&self) -> Result<Vec<Task>, StorageError> {
        Ok(self.inner.lock().tasks.iter().filter(|t| t.status == TaskStatus::Running).cloned().collect())
    }

    async fn count_todo_tasks(&self) -> Result<u32, StorageError> {
        Ok(self.inner.lock().tasks.iter().filter(|t| t.status == TaskStatus::ToDo).count() as u32)
    }

    async fn list_free_nodes(&self) -> Result<Vec<Node>, StorageError> {
        let inner = self.inner.lock();
        let busy: HashSet<String> = inner
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Running)
            .filter_map(|t| t.ip.clone())
            .collect();
        Ok(inner.nodes.iter().filter(|n| n.enabled && !busy.contains(&n.ip.to_string())).cloned().collect())
    }

    async fn list_busy_ips(&self) -> Result<HashSet<NodeIp>, StorageError> {
        let inner = self.inner.lock();
        Ok(inner
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Running)
            .filter_map(|t| t.ip.as_deref().and_then(|s| NodeIp::parse(s).ok()))
            .collect())
    }

    async fn finish(&self, task_id: TaskId, metadata: Option<TaskMetadata>) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        let task = inner.tasks.iter_mut().find(|t| t.id == task_id).ok_or(StorageError::TaskNotFound(task_id))?;
        task.status = TaskStatus::Done;
        if let Some(metadata) = metadata {
            task.metadata = metadata;
        }
        Ok(())
    }

    async fn recover_orphans(&self, dead_ips: &[NodeIp]) -> Result<usize, StorageError> {
        let mut inner = self.inner.lock();
        let dead: HashSet<String> = dead_ips.iter().map(|ip| ip.to_string()).collect();
        let mut recovered = 0;
        for task in inner.tasks.iter_mut() {
            if task.status == TaskStatus::Running && task.ip.as_ref().is_some_and(|ip| dead.contains(ip)) {
                task.status = TaskStatus::ToDo;
                task.ip = None;
                recovered += 1;
            }
        }
        Ok(recovered)
    }

    async fn register_node(&self, node: Node) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        match inner.nodes.iter_mut().find(|n| n.ip == node.ip) {
            Some(existing) => *existing = node,
            None => inner.nodes.push(node),
        }
        Ok(())
    }

    async fn set_node_enabled(&self, ip: NodeIp, enabled: bool) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        let node = inner.nodes.iter_mut().find(|n| n.ip == ip).ok_or(StorageError::NodeNotFound(ip))?;
        node.enabled = enabled;
        Ok(())
    }

    async fn set_node_ncpus(&self, ip: NodeIp, ncpus: u16) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        let node = inner.nodes.iter_mut().find(|n| n.ip == ip).ok_or(StorageError::NodeNotFound(ip))?;
        node.ncpus = Some(ncpus);
        Ok(())
    }

    async fn delete_node(&self, ip: NodeIp) -> Result<(), StorageError> {
        self.inner.lock().nodes.retain(|n| n.ip != ip);
        Ok(())
    }

    async fn get_node(&self, ip: NodeIp) -> Result<Option<Node>, StorageError> {
        Ok(self.inner.lock().nodes.iter().find(|n| n.ip == ip).cloned())
    }

    async fn list_nodes(&self) -> Result<Vec<Node>, StorageError> {
        Ok(self.inner.lock().nodes.clone())
    }

    async fn list_cloud_nodes(&self, cloud: &str) -> Result<Vec<Node>, StorageError> {
        Ok(self.inner.lock().nodes.iter().filter(|n| n.cloud.as_deref() == Some(cloud)).cloned().collect())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
