// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `yastatus`: list currently running tasks and the number waiting to be
//! claimed. `TaskNodeRepository` exposes no "list everything ever
//! submitted" query (DONE/FAILED tasks are a storage-layer concern, not
//! an operator-facing one here), so this is what §6's "thin wrapper over
//! the core API" framing leaves to show.

use anyhow::Context;
use yascheduler_config::Config;
use yascheduler_storage::{PgRepository, TaskNodeRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading config")?;
    let repo = PgRepository::connect(&config.db.connection_url(), 4).await.context("connecting to database")?;

    let running = repo.list_running().await.context("listing running tasks")?;
    let todo = repo.count_todo_tasks().await.context("counting queued tasks")?;

    println!("{todo} task(s) waiting to be claimed");
    println!("{} task(s) running:", running.len());
    for task in running {
        let ip = task.ip.as_deref().unwrap_or("-");
        println!("  {:>8}  {:<20}  {:<10}  {ip}", task.id, task.label, task.metadata.engine);
    }

    Ok(())
}
