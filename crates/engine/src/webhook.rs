// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Webhook sender (§6): "on task DONE, HTTP POST to the URL in task
//! metadata with a JSON body `{task_id, label, status}`." Fire-and-
//! forget, drained under `webhook_reqs_limit` concurrency (§4.6 step 4,
//! §5).

use serde::Serialize;
use std::sync::Arc;
use yascheduler_core::{BoundedSemaphore, TaskId, TaskStatus};

#[derive(Debug, Clone, Serialize)]
struct WebhookPayload {
    task_id: i64,
    label: String,
    status: &'static str,
}

fn status_name(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::ToDo => "TO_DO",
        TaskStatus::Running => "RUNNING",
        TaskStatus::Done => "DONE",
    }
}

pub struct WebhookSender {
    client: reqwest::Client,
    limit: Arc<BoundedSemaphore>,
}

impl WebhookSender {
    pub fn new(limit: Arc<BoundedSemaphore>) -> Self {
        Self { client: reqwest::Client::new(), limit }
    }

    /// Queue one delivery. Per §7 `WebhookFailed`: "log only; never
    /// re-delivered" — failures, including a full queue, are logged and
    /// dropped rather than surfaced to the caller.
    pub async fn enqueue(&self, url: String, task_id: TaskId, label: String, status: TaskStatus) {
        let permit = match self.limit.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                tracing::warn!(%task_id, "webhook queue full, dropping delivery");
                return;
            }
        };
        let payload = WebhookPayload { task_id: task_id.0, label, status: status_name(status) };
        let result = self.client.post(&url).json(&payload).send().await;
        drop(permit);
        match result {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(%task_id, %url, "webhook delivered");
            }
            Ok(response) => {
                tracing::warn!(%task_id, %url, status = %response.status(), "webhook rejected");
            }
            Err(e) => {
                tracing::warn!(%task_id, %url, error = %e, "webhook delivery failed");
            }
        }
    }
}

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod tests;
