// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `yasetnode`: admin enable/disable/remove for a node row.
//!
//! Removing a cloud-owned node here never calls the cloud adapter — that
//! would race the coordinator's own scale-down bookkeeping. Deleting a
//! cloud node's row by hand is an out-of-band operator action; the
//! instance itself is left for the operator (or the provider's own
//! console) to reclaim.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use yascheduler_config::Config;
use yascheduler_core::NodeIp;
use yascheduler_storage::{PgRepository, TaskNodeRepository};

#[derive(Parser, Debug)]
#[command(name = "yasetnode")]
struct Args {
    /// Node IP address.
    #[arg(value_parser = parse_ip)]
    ip: NodeIp,

    #[command(subcommand)]
    action: Action,
}

fn parse_ip(s: &str) -> Result<NodeIp, String> {
    NodeIp::parse(s).map_err(|_| format!("'{s}' is not a valid IP address"))
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Mark the node enabled, eligible for dispatch again.
    Enable,
    /// Mark the node disabled; it is left alone, not deallocated.
    Disable,
    /// Remove the node's row. Cloud-owned nodes are not deallocated.
    Remove,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let ip = args.ip;
    let config = Config::load().context("loading config")?;
    let repo = PgRepository::connect(&config.db.connection_url(), 4).await.context("connecting to database")?;

    let Some(node) = repo.get_node(ip).await.context("looking up node")? else {
        bail!("no such node: {ip}");
    };

    match args.action {
        Action::Enable => {
            repo.set_node_enabled(ip, true).await.context("enabling node")?;
            println!("{ip} enabled");
        }
        Action::Disable => {
            repo.set_node_enabled(ip, false).await.context("disabling node")?;
            println!("{ip} disabled");
        }
        Action::Remove => {
            if node.cloud.is_some() {
                eprintln!(
                    "warning: {ip} is cloud-owned ({}); its row is removed here but the underlying instance is not deallocated",
                    node.cloud.as_deref().unwrap_or("?")
                );
            }
            repo.delete_node(ip).await.context("removing node")?;
            println!("{ip} removed");
        }
    }

    Ok(())
}
