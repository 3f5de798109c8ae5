// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;
use yascheduler_core::test_support::NodeBuilder;
use yascheduler_core::FakeClock;
use yascheduler_cloud::FakeAdapter;
use yascheduler_storage::FakeRepository;

fn provider(name: &str, adapter: Arc<FakeAdapter>, max_nodes: u32, priority: i32) -> ProviderConfig {
    ProviderConfig {
        name: name.to_string(),
        adapter,
        max_nodes,
        priority,
        idle_tolerance: Duration::from_secs(300),
        ssh_user: "root".to_string(),
    }
}

/// S4 — scale-up respects priority order and each provider's `max_nodes`
/// ceiling: with two TO_DO-shaped demand units and a higher-priority
/// provider capped at one node, the overflow spills to the next provider.
#[tokio::test]
async fn scale_up_honors_priority_and_max_nodes() {
    let repo = Arc::new(FakeRepository::new());
    repo.submit(
        "t1",
        yascheduler_core::TaskMetadata::new("dummy".to_string(), vec![], vec![]),
    )
    .await
    .unwrap();
    repo.submit(
        "t2",
        yascheduler_core::TaskMetadata::new("dummy".to_string(), vec![], vec![]),
    )
    .await
    .unwrap();

    let high = Arc::new(FakeAdapter::new("high"));
    let low = Arc::new(FakeAdapter::new("low"));
    let providers = vec![provider("high", high.clone(), 1, 10), provider("low", low.clone(), 5, 1)];

    let coordinator = CloudCoordinator::new(
        repo.clone(),
        providers,
        Arc::new(BoundedSemaphore::new(4, 4)),
        Arc::new(BoundedSemaphore::new(4, 4)),
        Duration::from_secs(60),
        FakeClock::new(),
    );
    coordinator.tick().await;

    assert_eq!(high.active_count(), 1, "higher-priority provider fills first, capped at max_nodes");
    assert_eq!(low.active_count(), 1, "overflow demand spills to the next provider in priority order");
    assert_eq!(repo.list_cloud_nodes("high").await.unwrap().len(), 1);
    assert_eq!(repo.list_cloud_nodes("low").await.unwrap().len(), 1);
}

/// S5 — scale-down waits out `idle_tolerance`: a cloud node with no
/// running task is left alone until it has been idle continuously for at
/// least `idle_tolerance`, then it is disabled, deleted, and deregistered.
#[tokio::test]
async fn scale_down_waits_for_idle_tolerance() {
    let repo = Arc::new(FakeRepository::new());
    let adapter = Arc::new(FakeAdapter::new("aws"));
    let ip = adapter.create_node().await.unwrap();
    repo.register_node(NodeBuilder::default().ip(ip).cloud("aws".to_string()).build()).await.unwrap();

    let clock = FakeClock::new();
    let providers = vec![ProviderConfig {
        name: "aws".to_string(),
        adapter: adapter.clone(),
        max_nodes: 5,
        priority: 1,
        idle_tolerance: Duration::from_secs(60),
        ssh_user: "root".to_string(),
    }];

    let coordinator = CloudCoordinator::new(
        repo.clone(),
        providers,
        Arc::new(BoundedSemaphore::new(4, 4)),
        Arc::new(BoundedSemaphore::new(4, 4)),
        Duration::from_secs(60),
        clock.clone(),
    );

    coordinator.tick().await;
    assert!(repo.get_node(ip).await.unwrap().is_some(), "idle streak just started; node survives this tick");

    clock.advance(Duration::from_secs(30));
    coordinator.tick().await;
    assert!(repo.get_node(ip).await.unwrap().is_some(), "idle_tolerance not yet elapsed");

    clock.advance(Duration::from_secs(40));
    coordinator.tick().await;
    assert!(repo.get_node(ip).await.unwrap().is_none(), "idle_tolerance elapsed; node deregistered");
    assert_eq!(adapter.active_count(), 0, "cloud-side node deleted too");
}
