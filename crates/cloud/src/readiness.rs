// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared "wait for SSH readiness or time out" polling used by every
//! concrete adapter (§4.4: "creation returns only when the node reports
//! SSH readiness or a provider-specific timeout elapses"). A bare TCP
//! connect to port 22 is enough signal here — the deployer in
//! `yascheduler-remote` is what actually authenticates later.

use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout, Instant};

pub async fn wait_for_ssh_ready(ip: &str, creation_timeout: Duration, poll_interval: Duration) -> bool {
    let deadline = Instant::now() + creation_timeout;
    loop {
        let attempt = timeout(poll_interval, TcpStream::connect((ip, 22))).await;
        if matches!(attempt, Ok(Ok(_))) {
            tracing::debug!(ip, "node reports ssh readiness");
            return true;
        }
        if Instant::now() >= deadline {
            tracing::warn!(ip, ?creation_timeout, "node did not become ssh-ready before creation timeout");
            return false;
        }
        sleep(poll_interval).await;
    }
}
