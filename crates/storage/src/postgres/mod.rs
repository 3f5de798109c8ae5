// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PostgreSQL-backed [`TaskNodeRepository`], built on `sqlx` runtime
//! queries (no compile-time `query!` macros, since this workspace has no
//! database reachable at build time).

pub mod schema;

use crate::error::{classify, StorageError};
use crate::repository::TaskNodeRepository;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool, Row};
use std::collections::HashSet;
use std::time::Duration;
use yascheduler_core::{EngineName, Node, NodeIp, Task, TaskId, TaskMetadata, TaskStatus};

#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await
            .map_err(classify)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the DDL of §6 (used by `yainit`; idempotent).
    pub async fn init_schema(&self) -> Result<(), StorageError> {
        sqlx::query(schema::CREATE_NODES_TABLE).execute(&self.pool).await.map_err(classify)?;
        sqlx::query(schema::CREATE_TASKS_TABLE).execute(&self.pool).await.map_err(classify)?;
        sqlx::query(schema::CREATE_TASKS_STATUS_INDEX).execute(&self.pool).await.map_err(classify)?;
        Ok(())
    }
}

#[derive(FromRow)]
struct TaskRow {
    task_id: i64,
    label: String,
    metadata: serde_json::Value,
    ip: Option<String>,
    status: i16,
}

impl TaskRow {
    fn into_task(self) -> Result<Task, StorageError> {
        let metadata: TaskMetadata = serde_json::from_value(self.metadata)
            .map_err(|e| StorageError::Permanent(sqlx::Error::Decode(Box::new(e))))?;
        let status = TaskStatus::from_code(self.status)
            .ok_or_else(|| StorageError::Permanent(sqlx::Error::Decode("unknown task status code".into())))?;
        Ok(Task { id: TaskId::new(self.task_id), label: self.label, metadata, ip: self.ip, status })
    }
}

#[derive(FromRow)]
struct NodeRow {
    ip: String,
    ncpus: Option<i16>,
    enabled: bool,
    cloud: Option<String>,
    username: String,
}

impl NodeRow {
    fn into_node(self) -> Result<Node, StorageError> {
        let ip = NodeIp::parse(&self.ip)
            .map_err(|e| StorageError::Permanent(sqlx::Error::Decode(Box::new(e))))?;
        Ok(Node { ip, ncpus: self.ncpus.map(|n| n as u16), enabled: self.enabled, cloud: self.cloud, username: self.username })
    }
}

#[async_trait]
impl TaskNodeRepository for PgRepository {
    async fn submit(&self, label: &str, metadata: TaskMetadata) -> Result<TaskId, StorageError> {
        let metadata_json = serde_json::to_value(&metadata)
            .map_err(|e| StorageError::Permanent(sqlx::Error::Configuration(Box::new(e))))?;
        let row = sqlx::query(
            "INSERT INTO yascheduler_tasks (label, metadata, status) VALUES ($1, $2, 0) RETURNING task_id",
        )
        .bind(label)
        .bind(metadata_json)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;
        Ok(TaskId::new(row.try_get::<i64, _>("task_id").map_err(classify)?))
    }

    async fn claim_ready_tasks(
        &self,
        candidate_ips: &[NodeIp],
        engine: &EngineName,
    ) -> Result<Vec<(Task, NodeIp)>, StorageError> {
        if candidate_ips.is_empty() {
            return Ok(Vec::new());
        }
        let ip_strings: Vec<String> = candidate_ips.iter().map(|ip| ip.to_string()).collect();

        let rows = sqlx::query_as::<_, TaskRow>(
            r#"
            WITH locked_tasks AS (
                SELECT task_id, ROW_NUMBER() OVER (ORDER BY task_id) AS rn
                FROM yascheduler_tasks
                WHERE status = 0 AND metadata->>'engine' = $1
                ORDER BY task_id
                FOR UPDATE SKIP LOCKED
            ),
            locked_nodes AS (
                SELECT ip, ROW_NUMBER() OVER (ORDER BY ip) AS rn
                FROM yascheduler_nodes
                WHERE ip = ANY($2) AND enabled = true
                ORDER BY ip
                FOR UPDATE SKIP LOCKED
            ),
            pairs AS (
                SELECT t.task_id, n.ip
                FROM locked_tasks t
                JOIN locked_nodes n ON t.rn = n.rn
            )
            UPDATE yascheduler_tasks
            SET status = 1, ip = pairs.ip
            FROM pairs
            WHERE yascheduler_tasks.task_id = pairs.task_id
            RETURNING yascheduler_tasks.task_id, yascheduler_tasks.label, yascheduler_tasks.metadata, yascheduler_tasks.ip, yascheduler_tasks.status
            "#,
        )
        .bind(engine)
        .bind(&ip_strings)
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let ip = row
                .ip
                .as_deref()
                .and_then(|s| NodeIp::parse(s).ok())
                .ok_or_else(|| StorageError::Permanent(sqlx::Error::Decode("claimed task has no ip".into())))?;
            out.push((row.into_task()?, ip));
        }
        Ok(out)
    }

    async fn list_running(&self) -> Result<Vec<Task>, StorageError> {
        let rows = sqlx::query_as::<_, TaskRow>(
            "SELECT task_id, label, metadata, ip, status FROM yascheduler_tasks WHERE status = 1",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;
        rows.into_iter().map(TaskRow::into_task).collect()
    }

    async fn count_todo_tasks(&self) -> Result<u32, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM yascheduler_tasks WHERE status = 0")
            .fetch_one(&self.pool)
            .await
            .map_err(classify)?;
        let n: i64 = row.try_get("n").map_err(classify)?;
        Ok(n as u32)
    }

    async fn list_free_nodes(&self) -> Result<Vec<Node>, StorageError> {
        let rows = sqlx::query_as::<_, NodeRow>(
            r#"
            SELECT n.ip, n.ncpus, n.enabled, n.cloud, n.username
            FROM yascheduler_nodes n
            WHERE n.enabled = true
              AND NOT EXISTS (
                  SELECT 1 FROM yascheduler_tasks t WHERE t.status = 1 AND t.ip = n.ip
              )
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;
        rows.into_iter().map(NodeRow::into_node).collect()
    }

    async fn list_busy_ips(&self) -> Result<HashSet<NodeIp>, StorageError> {
        let rows = sqlx::query("SELECT DISTINCT ip FROM yascheduler_tasks WHERE status = 1 AND ip IS NOT NULL")
            .fetch_all(&self.pool)
            .await
            .map_err(classify)?;
        rows.into_iter()
            .map(|r| {
                let ip_str: String = r.try_get("ip").map_err(classify)?;
                NodeIp::parse(&ip_str).map_err(|e| StorageError::Permanent(sqlx::Error::Decode(Box::new(e))))
            })
            .collect()
    }

    async fn finish(&self, task_id: TaskId, metadata: Option<TaskMetadata>) -> Result<(), StorageError> {
        match metadata {
            Some(metadata) => {
                let metadata_json = serde_json::to_value(&metadata)
                    .map_err(|e| StorageError::Permanent(sqlx::Error::Configuration(Box::new(e))))?;
                sqlx::query("UPDATE yascheduler_tasks SET status = 2, metadata = $2 WHERE task_id = $1")
                    .bind(task_id.0)
                    .bind(metadata_json)
                    .execute(&self.pool)
                    .await
                    .map_err(classify)?;
            }
            None => {
                sqlx::query("UPDATE yascheduler_tasks SET status = 2 WHERE task_id = $1")
                    .bind(task_id.0)
                    .execute(&self.pool)
                    .await
                    .map_err(classify)?;
            }
        }
        Ok(())
    }

    async fn recover_orphans(&self, dead_ips: &[NodeIp]) -> Result<usize, StorageError> {
        if dead_ips.is_empty() {
            return Ok(0);
        }
        let ip_strings: Vec<String> = dead_ips.iter().map(|ip| ip.to_string()).collect();
        let result = sqlx::query(
            "UPDATE yascheduler_tasks SET status = 0, ip = NULL WHERE status = 1 AND ip = ANY($1)",
        )
        .bind(&ip_strings)
        .execute(&self.pool)
        .await
        .map_err(classify)?;
        Ok(result.rows_affected() as usize)
    }

    async fn register_node(&self, node: Node) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO yascheduler_nodes (ip, ncpus, enabled, cloud, username) VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (ip) DO UPDATE SET ncpus = $2, enabled = $3, cloud = $4, username = $5",
        )
        .bind(node.ip.to_string())
        .bind(node.ncpus.map(|n| n as i16))
        .bind(node.enabled)
        .bind(node.cloud)
        .bind(node.username)
        .execute(&self.pool)
        .await
        .map_err(classify)?;
        Ok(())
    }

    async fn set_node_enabled(&self, ip: NodeIp, enabled: bool) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE yascheduler_nodes SET enabled = $2 WHERE ip = $1")
            .bind(ip.to_string())
            .bind(enabled)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NodeNotFound(ip));
        }
        Ok(())
    }

    async fn set_node_ncpus(&self, ip: NodeIp, ncpus: u16) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE yascheduler_nodes SET ncpus = $2 WHERE ip = $1")
            .bind(ip.to_string())
            .bind(ncpus as i16)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NodeNotFound(ip));
        }
        Ok(())
    }

    async fn delete_node(&self, ip: NodeIp) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM yascheduler_nodes WHERE ip = $1")
            .bind(ip.to_string())
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn get_node(&self, ip: NodeIp) -> Result<Option<Node>, StorageError> {
        let row = sqlx::query_as::<_, NodeRow>(
            "SELECT ip, ncpus, enabled, cloud, username FROM yascheduler_nodes WHERE ip = $1",
        )
        .bind(ip.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;
        row.map(NodeRow::into_node).transpose()
    }

    async fn list_nodes(&self) -> Result<Vec<Node>, StorageError> {
        let rows = sqlx::query_as::<_, NodeRow>("SELECT ip, ncpus, enabled, cloud, username FROM yascheduler_nodes")
            .fetch_all(&self.pool)
            .await
            .map_err(classify)?;
        rows.into_iter().map(NodeRow::into_node).collect()
    }

    async fn list_cloud_nodes(&self, cloud: &str) -> Result<Vec<Node>, StorageError> {
        let rows = sqlx::query_as::<_, NodeRow>(
            "SELECT ip, ncpus, enabled, cloud, username FROM yascheduler_nodes WHERE cloud = $1",
        )
        .bind(cloud)
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;
        rows.into_iter().map(NodeRow::into_node).collect()
    }
}
