// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn admits_up_to_limit_concurrently() {
    let sem = BoundedSemaphore::new(2, 0);
    let _a = sem.acquire().await.expect("first admitted");
    let _b = sem.acquire().await.expect("second admitted");
    assert_eq!(sem.in_flight(), 2);
}

#[tokio::test]
async fn rejects_when_pending_queue_is_full() {
    let sem = BoundedSemaphore::new(1, 0);
    let _permit = sem.acquire().await.expect("first admitted");
    // limit exhausted, pending_limit is 0, so a second request is rejected
    // immediately rather than queued.
    assert!(sem.acquire().await.is_err());
}

#[tokio::test]
async fn queues_up_to_pending_limit_then_rejects() {
    let sem = BoundedSemaphore::new(1, 1);
    let permit = sem.acquire().await.expect("first admitted");

    let sem2 = sem.clone();
    let queued = tokio::spawn(async move { sem2.acquire().await });

    // give the spawned task a chance to register as pending
    tokio::task::yield_now().await;
    assert!(sem.acquire().await.is_err(), "third request exceeds limit+pending");

    drop(permit);
    let result = queued.await.expect("task did not panic");
    assert!(result.is_ok(), "queued request is admitted once a permit frees up");
}

#[tokio::test]
async fn releases_permit_on_drop() {
    let sem = BoundedSemaphore::new(1, 0);
    {
        let _permit = sem.acquire().await.expect("admitted");
        assert_eq!(sem.in_flight(), 1);
    }
    assert_eq!(sem.in_flight(), 0);
    assert!(sem.acquire().await.is_ok());
}
