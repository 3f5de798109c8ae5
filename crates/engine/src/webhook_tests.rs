// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

#[tokio::test]
async fn drops_delivery_when_queue_is_full_without_hanging() {
    let limit = Arc::new(BoundedSemaphore::new(1, 0));
    let held = limit.clone().acquire().await.unwrap();
    let sender = WebhookSender::new(limit);

    let result = tokio::time::timeout(
        Duration::from_secs(1),
        sender.enqueue("http://127.0.0.1:9/hook".into(), TaskId::new(1), "job".into(), TaskStatus::Done),
    )
    .await;

    assert!(result.is_ok(), "enqueue should return immediately when the queue is full");
    drop(held);
}
