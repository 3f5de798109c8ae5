// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task: a unit of submitted work plus its lifecycle status.

use crate::engine_def::EngineName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Strictly monotonic task identifier, backed by the `tasks.task_id SERIAL`
/// column. Unlike the nanoid-based ids elsewhere in this workspace, task ids
/// must sort the same way the database assigns them (FIFO claim order), so
/// this wraps the raw integer rather than going through [`crate::define_id!`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl TaskId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TaskId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Status codes match the `yascheduler_tasks.status` SMALLINT column
/// verbatim (§6): 0 = TO_DO, 1 = RUNNING, 2 = DONE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i16)]
pub enum TaskStatus {
    ToDo = 0,
    Running = 1,
    Done = 2,
}

impl TaskStatus {
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::ToDo),
            1 => Some(Self::Running),
            2 => Some(Self::Done),
            _ => None,
        }
    }

    pub fn code(self) -> i16 {
        self as i16
    }
}

crate::simple_display! {
    TaskStatus {
        ToDo => "TO_DO",
        Running => "RUNNING",
        Done => "DONE",
    }
}

/// Per-file failure recorded when a declared output could not be downloaded
/// during harvest (§4.6 step 1: "mark DONE regardless of download outcome,
/// attaching a per-file error list to metadata").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputError {
    pub file: String,
    pub error: String,
}

/// Structured view of the `tasks.metadata` JSONB column (§3 ADDED: metadata
/// schema). This is the only place that column's shape is defined; every
/// reader/writer of task metadata goes through this type rather than
/// poking at raw `serde_json::Value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMetadata {
    pub engine: EngineName,
    pub input_files: Vec<String>,
    pub output_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ncpus: Option<u16>,
    /// Populated only after a harvest with partial download failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<OutputError>>,
    /// Arbitrary extra key/value pairs the submitter attached; preserved
    /// round-trip but never interpreted by the core.
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl TaskMetadata {
    pub fn new(engine: EngineName, input_files: Vec<String>, output_files: Vec<String>) -> Self {
        Self {
            engine,
            input_files,
            output_files,
            webhook_url: None,
            ncpus: None,
            errors: None,
            extra: BTreeMap::new(),
        }
    }
}

/// A submitted task row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub label: String,
    pub metadata: TaskMetadata,
    pub ip: Option<NodeIpOwned>,
    pub status: TaskStatus,
}

/// Owned IP string, kept distinct from [`crate::node::NodeIp`]'s borrowed
/// validation helpers so `Task` can be `Clone`/`Serialize` without a
/// lifetime.
pub type NodeIpOwned = String;

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
