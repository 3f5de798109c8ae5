// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn create_node_assigns_distinct_ips() {
    let adapter = FakeAdapter::new("test-cloud");
    let a = adapter.create_node().await.unwrap();
    let b = adapter.create_node().await.unwrap();
    assert_ne!(a, b);
    assert_eq!(adapter.active_count(), 2);
}

#[tokio::test]
async fn delete_node_removes_from_registry() {
    let adapter = FakeAdapter::new("test-cloud");
    let ip = adapter.create_node().await.unwrap();
    adapter.delete_node(&ip).await.unwrap();
    assert_eq!(adapter.active_count(), 0);
}

#[tokio::test]
async fn list_nodes_reflects_creates_and_deletes() {
    let adapter = FakeAdapter::new("test-cloud");
    let a = adapter.create_node().await.unwrap();
    let b = adapter.create_node().await.unwrap();
    adapter.delete_node(&a).await.unwrap();
    assert_eq!(adapter.list_nodes().await.unwrap(), vec![b]);
}

#[tokio::test]
async fn create_node_fails_when_configured_to() {
    let adapter = FakeAdapter::new("test-cloud");
    *adapter.fail_create.lock() = true;
    let result = adapter.create_node().await;
    assert!(matches!(result, Err(CloudError::ApiError { .. })));
}
