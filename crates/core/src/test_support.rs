// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test-only builders, exported to dependent crates' tests behind
//! `feature = "test-support"`: production code never sees these types.

use crate::engine_def::{DeploySource, EngineDef, LivenessCheck};
use crate::node::{Node, NodeIp};
use crate::task::{Task, TaskId, TaskMetadata, TaskStatus};
use std::collections::HashSet;
use std::time::Duration;

pub fn test_node_ip(last_octet: u8) -> NodeIp {
    NodeIp::parse(&format!("10.0.0.{last_octet}")).expect("valid test ip")
}

crate::builder! {
    pub struct TaskBuilder => Task {
        set { id: TaskId = TaskId::new(1) }
        into { label: String = "test-task" }
        option { ip: String = None }
        set { status: TaskStatus = TaskStatus::ToDo }
        computed { metadata: TaskMetadata = TaskMetadata::new(
            "dummy".to_string(),
            vec!["1.input".into()],
            vec!["1.input.out".into()],
        ) }
    }
}

crate::builder! {
    pub struct NodeBuilder => Node {
        set { ip: NodeIp = test_node_ip(1) }
        option { ncpus: u16 = None }
        set { enabled: bool = true }
        option { cloud: String = None }
        into { username: String = "root" }
    }
}

/// A minimal, always-valid engine definition for tests that don't care
/// about the specifics, mirroring scenario S1's `dummy` engine.
pub fn dummy_engine_def() -> EngineDef {
    EngineDef::new(
        "dummy",
        HashSet::from(["debian-11".to_string()]),
        vec![],
        DeploySource::LocalFiles { files: vec!["dummyengine".into()] },
        "{engine_path}/dummyengine {task_path}/1.input".into(),
        LivenessCheck::ProcessName { pname: "dummyengine".into() },
        Duration::from_secs(1),
        vec!["1.input".into()],
        vec!["1.input.out".into()],
    )
    .expect("dummy engine def is valid by construction")
}

#[cfg(test)]
#[path = "test_support_tests.rs"]
mod tests;
