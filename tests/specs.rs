// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-level acceptance tests exercising the scenarios of spec.md
//! §8 across crate boundaries — config loading through to a task's
//! full cloud-node lifecycle — rather than any single crate in
//! isolation.

use serial_test::serial;
use std::collections::HashMap as Map;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use yascheduler_cloud::FakeAdapter;
use yascheduler_config::Config;
use yascheduler_core::{test_support::test_node_ip, BoundedSemaphore, SystemClock, TaskMetadata};
use yascheduler_engine::coordinator::ProviderConfig;
use yascheduler_engine::{new_node_locks, CloudCoordinator, Reconciler, WebhookSender};
use yascheduler_remote::{FakeMachine, Machine};
use yascheduler_storage::{FakeRepository, TaskNodeRepository};

fn write_conf(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("tempfile");
    file.write_all(contents.as_bytes()).expect("write");
    file
}

const VALID_CONF: &str = r#"
[db]
host = localhost
port = 5432
database = yascheduler
user = yascheduler

[local]
data_dir = /var/lib/yascheduler
keys_dir = %(data_dir)s/keys
engines_dir = %(data_dir)s/engines

[remote]
engines_dir = engines
tasks_dir = tasks

[engine.dummy]
platforms = debian-11
deploy_local_files = dummyengine
spawn = {engine_path}/dummyengine {task_path}/1.input
check_pname = dummyengine
sleep_interval = 1
input_files = 1.input
output_files = 1.input.out
"#;

/// S6 — a `spawn` template referencing an unrecognized placeholder is
/// rejected the moment the config is loaded, which is strictly earlier
/// than, and therefore satisfies, "rejected at submission": no task can
/// ever be submitted against an engine whose config failed to load.
#[test]
#[serial]
fn unknown_spawn_placeholder_rejected_at_config_load() {
    let bad = VALID_CONF.replace(
        "spawn = {engine_path}/dummyengine {task_path}/1.input",
        "spawn = {engine_path}/dummyengine {bogus_placeholder}",
    );
    let file = write_conf(&bad);
    let result = Config::load_from_path(file.path());
    assert!(result.is_err(), "unknown placeholder must fail config load, not surface only at submission");
}

#[test]
#[serial]
fn valid_config_loads_end_to_end() {
    let file = write_conf(VALID_CONF);
    let cfg = Config::load_from_path(file.path()).expect("loads");
    assert_eq!(cfg.engines.len(), 1);
    assert!(cfg.engines.contains_key("dummy"));
}

/// Full lifecycle across `engine::CloudCoordinator` and
/// `engine::Reconciler` sharing one `FakeRepository`: a task submitted
/// with no static nodes drives a cloud scale-up, the new node completes
/// the task, and once disabled the same node is deallocated on the next
/// scale-down pass — exercising §7's "Disable node; if cloud-owned,
/// deallocate" across both control loops, not just within one.
#[tokio::test]
async fn task_drives_cloud_scale_up_then_disabled_node_is_deallocated() {
    let repo = Arc::new(FakeRepository::new());
    repo.submit(
        "cloud-lifecycle",
        TaskMetadata::new("dummy".to_string(), vec!["1.input".into()], vec!["1.input.out".into()]),
    )
    .await
    .unwrap();

    let adapter = Arc::new(FakeAdapter::new("openstack-test"));
    let providers = vec![ProviderConfig {
        name: "openstack-test".to_string(),
        adapter: adapter.clone(),
        max_nodes: 4,
        priority: 0,
        idle_tolerance: Duration::from_secs(60),
        ssh_user: "yascheduler".to_string(),
    }];

    let coordinator = Arc::new(CloudCoordinator::new(
        repo.clone(),
        providers,
        Arc::new(BoundedSemaphore::new(4, 4)),
        Arc::new(BoundedSemaphore::new(4, 4)),
        Duration::from_secs(300),
        SystemClock,
    ));

    coordinator.tick().await; // scale_up: no free node exists yet, creates one
    let nodes = repo.list_nodes().await.unwrap();
    assert_eq!(nodes.len(), 1, "coordinator must create exactly one cloud node to satisfy the one TO_DO task");
    let ip = nodes[0].ip;
    assert_eq!(nodes[0].cloud.as_deref(), Some("openstack-test"));

    let machine = Arc::new(FakeMachine::new("debian-11", 4));
    machine.local_file("/srv/yascheduler/tasks/1/1.input", "hello");
    let mut machines = Map::new();
    machines.insert(ip, machine.clone() as Arc<dyn Machine>);
    let machines_fn: Arc<dyn Fn(yascheduler_core::NodeIp) -> Option<Arc<dyn Machine>> + Send + Sync> = {
        let machines = machines.clone();
        Arc::new(move |ip| machines.get(&ip).cloned())
    };

    let mut engines = Map::new();
    engines.insert("dummy".to_string(), yascheduler_core::test_support::dummy_engine_def());

    let reconciler = Reconciler::new(
        repo.clone(),
        Arc::new(engines),
        machines_fn,
        new_node_locks(),
        Arc::new(WebhookSender::new(Arc::new(BoundedSemaphore::new(4, 4)))),
        "/srv/yascheduler/engines".into(),
        "/srv/yascheduler/tasks".into(),
        "engines".into(),
        "tasks".into(),
        Arc::new(BoundedSemaphore::new(4, 4)),
        Arc::new(BoundedSemaphore::new(4, 4)),
    );

    reconciler.tick().await; // assign: dispatches the task onto the cloud node
    assert_eq!(repo.list_running().await.unwrap().len(), 1);

    *machine.alive.lock() = false;
    reconciler.tick().await; // harvest: process exited -> DONE
    assert!(repo.list_running().await.unwrap().is_empty());

    // Simulate the reconciler having disabled this node on some other
    // task's deploy failure (§7); scale-down must reclaim it right away
    // rather than waiting out idle_tolerance.
    repo.set_node_enabled(ip, false).await.unwrap();
    coordinator.tick().await;

    assert_eq!(adapter.active_count(), 0, "scale-down must deallocate a disabled cloud node immediately");
    assert!(repo.get_node(ip).await.unwrap().is_none(), "deallocated node's row must be removed");
    let test_ip = test_node_ip(1);
    assert_ne!(ip, test_ip, "sanity: the synthetic cloud ip is distinct from the static-node helper's range");
}
