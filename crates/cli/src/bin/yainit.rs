// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `yainit`: creates the database schema of §6 (idempotent).

use anyhow::Context;
use yascheduler_config::Config;
use yascheduler_storage::PgRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading config")?;
    let repo = PgRepository::connect(&config.db.connection_url(), 4).await.context("connecting to database")?;
    repo.init_schema().await.context("creating schema")?;
    println!("schema ready");
    Ok(())
}
