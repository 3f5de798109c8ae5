// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap as Map;
use yascheduler_core::test_support::{dummy_engine_def, test_node_ip, NodeBuilder};
use yascheduler_core::BoundedSemaphore;
use yascheduler_remote::FakeMachine;
use yascheduler_storage::FakeRepository;

fn engines() -> Arc<HashMap<EngineName, EngineDef>> {
    let mut map = Map::new();
    map.insert("dummy".to_string(), dummy_engine_def());
    Arc::new(map)
}

fn reconciler(
    repo: Arc<FakeRepository>,
    machines: Map<NodeIp, Arc<FakeMachine>>,
) -> Reconciler<FakeRepository> {
    let machines: Arc<dyn Fn(NodeIp) -> Option<Arc<dyn Machine>> + Send + Sync> =
        Arc::new(move |ip| machines.get(&ip).map(|m| m.clone() as Arc<dyn Machine>));
    Reconciler::new(
        repo,
        engines(),
        machines,
        new_node_locks(),
        Arc::new(WebhookSender::new(Arc::new(BoundedSemaphore::new(4, 4)))),
        "/srv/yascheduler/engines".into(),
        "/srv/yascheduler/tasks".into(),
        "engines".into(),
        "tasks".into(),
        Arc::new(BoundedSemaphore::new(4, 4)),
        Arc::new(BoundedSemaphore::new(4, 4)),
    )
}

/// S1 — single task, single static node: the task reaches DONE and the
/// declared output file is downloaded.
#[tokio::test]
async fn single_task_single_node_completes() {
    let repo = Arc::new(FakeRepository::new());
    let ip = test_node_ip(1);
    repo.register_node(NodeBuilder::default().ip(ip).build()).await.unwrap();
    let task_id = repo
        .submit(
            "s1",
            yascheduler_core::TaskMetadata::new(
                "dummy".to_string(),
                vec!["1.input".into()],
                vec!["1.input.out".into()],
            ),
        )
        .await
        .unwrap();

    let machine = Arc::new(FakeMachine::new("debian-11", 4));
    machine.local_file("/srv/yascheduler/tasks/1/1.input", "hello");
    let mut machines = Map::new();
    machines.insert(ip, machine.clone());
    let r = reconciler(repo.clone(), machines);

    r.tick().await; // assign: claims the task, deploys, uploads, spawns
    let running = repo.list_running().await.unwrap();
    assert_eq!(running.len(), 1);
    assert_eq!(running[0].id, task_id);

    *machine.alive.lock() = false;
    r.tick().await; // harvest: process no longer alive -> DONE

    let running = repo.list_running().await.unwrap();
    assert!(running.is_empty());
}

/// S2 — unsupported platform: a node whose probed platform the engine
/// doesn't declare never gets the task assigned, and stays enabled.
#[tokio::test]
async fn unsupported_platform_node_is_skipped() {
    let repo = Arc::new(FakeRepository::new());
    let ip = test_node_ip(1);
    repo.register_node(NodeBuilder::default().ip(ip).build()).await.unwrap();
    repo.submit(
        "s2",
        yascheduler_core::TaskMetadata::new("dummy".to_string(), vec!["1.input".into()], vec![]),
    )
    .await
    .unwrap();

    let machine = Arc::new(FakeMachine::new("windows-10", 4));
    let mut machines = Map::new();
    machines.insert(ip, machine.clone());
    let r = reconciler(repo.clone(), machines);

    r.tick().await;

    let running = repo.list_running().await.unwrap();
    assert!(running.is_empty(), "task must not be assigned to an unsupported-platform node");
    let node = repo.get_node(ip).await.unwrap().unwrap();
    assert!(node.enabled, "node stays enabled; it may still host other engines");
    assert!(machine.commands_run().is_empty(), "no deployment should occur on this node");
}

/// S3 — node vanishes mid-run: the next tick observes the machine gone
/// and recovers the orphaned task back to TO_DO with `ip` cleared.
#[tokio::test]
async fn vanished_node_recovers_running_task_to_todo() {
    let repo = Arc::new(FakeRepository::new());
    let ip = test_node_ip(1);
    repo.register_node(NodeBuilder::default().ip(ip).build()).await.unwrap();
    repo.submit(
        "s3",
        yascheduler_core::TaskMetadata::new("dummy".to_string(), vec!["1.input".into()], vec![]),
    )
    .await
    .unwrap();

    let machine = Arc::new(FakeMachine::new("debian-11", 4));
    machine.local_file("/srv/yascheduler/tasks/1/1.input", "hello");
    let mut machines = Map::new();
    machines.insert(ip, machine.clone());
    let r = reconciler(repo.clone(), machines.clone());
    r.tick().await;
    assert_eq!(repo.list_running().await.unwrap().len(), 1);

    // Node X deleted out-of-band: a fresh reconciler sees no machine
    // handle for it and must treat "Recover" on the next tick.
    let r2 = reconciler(repo.clone(), Map::new());
    r2.tick().await;

    let running = repo.list_running().await.unwrap();
    assert!(running.is_empty(), "orphaned task must return to TO_DO");
    let free = repo.list_free_nodes().await.unwrap();
    assert_eq!(free.len(), 1, "recover only clears the task's ip, the node row itself is untouched");
}
