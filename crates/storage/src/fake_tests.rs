// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yascheduler_core::test_support::{test_node_ip, NodeBuilder};

fn metadata_for(engine: &str) -> TaskMetadata {
    TaskMetadata::new(engine.to_string(), vec!["1.input".into()], vec!["1.input.out".into()])
}

#[tokio::test]
async fn submit_assigns_monotonic_ids() {
    let repo = FakeRepository::new();
    let a = repo.submit("a", metadata_for("dummy")).await.unwrap();
    let b = repo.submit("b", metadata_for("dummy")).await.unwrap();
    assert!(b.0 > a.0);
}

#[tokio::test]
async fn claim_pairs_fifo_with_lowest_ip_first() {
    let repo = FakeRepository::new();
    repo.register_node(NodeBuilder::default().ip(test_node_ip(2)).build()).await.unwrap();
    repo.register_node(NodeBuilder::default().ip(test_node_ip(1)).build()).await.unwrap();

    let first = repo.submit("first", metadata_for("dummy")).await.unwrap();
    let _second = repo.submit("second", metadata_for("dummy")).await.unwrap();

    let claimed = repo
        .claim_ready_tasks(&[test_node_ip(1), test_node_ip(2)], &"dummy".to_string())
        .await
        .unwrap();

    assert_eq!(claimed.len(), 2);
    assert_eq!(claimed[0].0.id, first);
    assert_eq!(claimed[0].1, test_node_ip(1));
}

#[tokio::test]
async fn claim_ignores_other_engines_and_disabled_nodes() {
    let repo = FakeRepository::new();
    repo.register_node(NodeBuilder::default().ip(test_node_ip(1)).enabled(false).build()).await.unwrap();
    repo.submit("other-engine", metadata_for("not-dummy")).await.unwrap();

    let claimed = repo.claim_ready_tasks(&[test_node_ip(1)], &"dummy".to_string()).await.unwrap();
    assert!(claimed.is_empty());
}

#[tokio::test]
async fn recover_orphans_resets_running_tasks_on_dead_ips() {
    let repo = FakeRepository::new();
    repo.register_node(NodeBuilder::default().ip(test_node_ip(1)).build()).await.unwrap();
    repo.submit("t", metadata_for("dummy")).await.unwrap();
    repo.claim_ready_tasks(&[test_node_ip(1)], &"dummy".to_string()).await.unwrap();

    let recovered = repo.recover_orphans(&[test_node_ip(1)]).await.unwrap();
    assert_eq!(recovered, 1);

    let running = repo.list_running().await.unwrap();
    assert!(running.is_empty());
}

#[tokio::test]
async fn recover_orphans_is_idempotent() {
    let repo = FakeRepository::new();
    repo.register_node(NodeBuilder::default().ip(test_node_ip(1)).build()).await.unwrap();
    repo.submit("t", metadata_for("dummy")).await.unwrap();
    repo.claim_ready_tasks(&[test_node_ip(1)], &"dummy".to_string()).await.unwrap();

    assert_eq!(repo.recover_orphans(&[test_node_ip(1)]).await.unwrap(), 1);
    assert_eq!(repo.recover_orphans(&[test_node_ip(1)]).await.unwrap(), 0);
}

#[tokio::test]
async fn finish_marks_done_and_can_attach_errors() {
    let repo = FakeRepository::new();
    repo.register_node(NodeBuilder::default().ip(test_node_ip(1)).build()).await.unwrap();
    let id = repo.submit("t", metadata_for("dummy")).await.unwrap();
    repo.claim_ready_tasks(&[test_node_ip(1)], &"dummy".to_string()).await.unwrap();

    let mut metadata = metadata_for("dummy");
    metadata.errors = Some(vec![yascheduler_core::task::OutputError {
        file: "1.input.out".into(),
        error: "sftp timeout".into(),
    }]);
    repo.finish(id, Some(metadata.clone())).await.unwrap();

    assert!(repo.list_running().await.unwrap().is_empty());
}

#[tokio::test]
async fn list_free_nodes_excludes_busy_and_disabled() {
    let repo = FakeRepository::new();
    repo.register_node(NodeBuilder::default().ip(test_node_ip(1)).build()).await.unwrap();
    repo.register_node(NodeBuilder::default().ip(test_node_ip(2)).enabled(false).build()).await.unwrap();
    repo.submit("t", metadata_for("dummy")).await.unwrap();
    repo.claim_ready_tasks(&[test_node_ip(1)], &"dummy".to_string()).await.unwrap();

    let free = repo.list_free_nodes().await.unwrap();
    assert!(free.is_empty());
}
