// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded concurrency limiter shared by every rate-limited family in §5:
//! `conn_machine`, `allocate`, `consume`, `deallocate`, and the webhook
//! fan-out. Each family is `limit` in-flight plus `pending` queued; a
//! request arriving when both are exhausted is rejected immediately
//! rather than queued indefinitely ("Exceeding `*_pending` causes the
//! newest request to be dropped with a logged warning; the next tick will
//! retry.").

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("rate limit exceeded: pending queue is full")]
pub struct QueueFull;

/// A `limit`-in-flight, `pending`-queued admission controller.
#[derive(Clone)]
pub struct BoundedSemaphore {
    semaphore: Arc<Semaphore>,
    pending: Arc<AtomicUsize>,
    pending_limit: usize,
    limit: usize,
}

impl BoundedSemaphore {
    pub fn new(limit: usize, pending_limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            pending: Arc::new(AtomicUsize::new(0)),
            pending_limit,
            limit,
        }
    }

    /// Acquire a permit. If no permit is immediately available and the
    /// pending queue is already at capacity, returns [`QueueFull`]
    /// instead of waiting.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, QueueFull> {
        if self.semaphore.available_permits() > 0 {
            return self.semaphore.clone().acquire_owned().await.map_err(|_| QueueFull);
        }

        let queued = self.pending.fetch_add(1, Ordering::SeqCst);
        if queued >= self.pending_limit {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(QueueFull);
        }
        let permit = self.semaphore.clone().acquire_owned().await;
        self.pending.fetch_sub(1, Ordering::SeqCst);
        permit.map_err(|_| QueueFull)
    }

    pub fn in_flight(&self) -> usize {
        self.limit - self.semaphore.available_permits()
    }
}

#[cfg(test)]
#[path = "ratelimit_tests.rs"]
mod tests;
