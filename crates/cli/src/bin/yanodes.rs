// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `yanodes`: list the node registry.

use anyhow::Context;
use yascheduler_config::Config;
use yascheduler_storage::{PgRepository, TaskNodeRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading config")?;
    let repo = PgRepository::connect(&config.db.connection_url(), 4).await.context("connecting to database")?;

    let nodes = repo.list_nodes().await.context("listing nodes")?;
    let busy = repo.list_busy_ips().await.context("listing busy nodes")?;

    println!("{:<18}  {:<8}  {:<7}  {:<10}  {}", "ip", "enabled", "busy", "cloud", "ncpus");
    for node in nodes {
        let cloud = node.cloud.as_deref().unwrap_or("-");
        let ncpus = node.ncpus.map(|n| n.to_string()).unwrap_or_else(|| "-".into());
        let busy = busy.contains(&node.ip);
        println!("{:<18}  {:<8}  {:<7}  {cloud:<10}  {ncpus}", node.ip.to_string(), node.enabled, busy);
    }

    Ok(())
}
