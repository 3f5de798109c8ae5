// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! yaschedulerd: the daemon entry point of §6 — loads config, opens the
//! database, connects to every enabled static/cloud node, then runs the
//! reconciler and cloud coordinator ticks on one `tokio` runtime until a
//! shutdown signal arrives.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod cloud_adapters;
mod error;
mod logging;
mod machine_pool;
mod pidfile;

use clap::Parser;
use error::DaemonError;
use machine_pool::MachinePool;
use pidfile::Pidfile;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};
use yascheduler_config::Config;
use yascheduler_core::BoundedSemaphore;
use yascheduler_engine::{new_node_locks, CloudCoordinator, Reconciler, WebhookSender};
use yascheduler_storage::PgRepository;

const DEFAULT_PID_PATH: &str = "/var/run/yaschedulerd.pid";
const DEFAULT_LOG_PATH: &str = "/var/log/yaschedulerd.log";

/// Scheduler daemon: deploys, dispatches, and monitors tasks against
/// configured static and cloud-leased nodes.
#[derive(Parser, Debug)]
#[command(name = "yaschedulerd")]
struct Args {
    /// Pidfile path (overrides `YASCHEDULER_PID_PATH` and the built-in default).
    #[arg(short = 'p', long = "pidfile")]
    pidfile: Option<PathBuf>,

    /// Log file path (overrides `YASCHEDULER_LOG_PATH` and the built-in default).
    #[arg(short = 'l', long = "logfile")]
    logfile: Option<PathBuf>,
}

fn resolve(cli: Option<PathBuf>, env_var: &str, default: &str) -> PathBuf {
    cli.or_else(|| std::env::var(env_var).ok().map(PathBuf::from)).unwrap_or_else(|| PathBuf::from(default))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let pid_path = resolve(args.pidfile, "YASCHEDULER_PID_PATH", DEFAULT_PID_PATH);
    let log_path = resolve(args.logfile, "YASCHEDULER_LOG_PATH", DEFAULT_LOG_PATH);

    let _log_guard = logging::setup(&log_path)?;

    let _pidfile = match Pidfile::acquire(&pid_path) {
        Ok(p) => p,
        Err(DaemonError::AlreadyRunning { path, pid }) => {
            eprintln!("yaschedulerd is already running (pidfile {path}, pid {pid})");
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    let config = Config::load()?;
    if !config.unknown_keys.is_empty() {
        warn!(count = config.unknown_keys.len(), "config has unrecognized keys");
    }

    let repo = Arc::new(PgRepository::connect(&config.db.connection_url(), 10).await?);
    let engines = Arc::new(config.engines.clone());

    let rate = &config.local.rate_limits;
    let pool = Arc::new(MachinePool::new(rate.conn_machine_limit, rate.conn_machine_pending));
    let allocate = Arc::new(BoundedSemaphore::new(rate.allocate_limit, rate.allocate_pending));
    let consume = Arc::new(BoundedSemaphore::new(rate.consume_limit, rate.consume_pending));
    let deallocate = Arc::new(BoundedSemaphore::new(rate.deallocate_limit, rate.deallocate_pending));
    let webhook_limit = Arc::new(BoundedSemaphore::new(rate.webhook_reqs_limit, rate.webhook_reqs_limit));
    let webhook = Arc::new(WebhookSender::new(webhook_limit));

    let pool_for_closure = Arc::clone(&pool);
    let machines_fn: Arc<dyn Fn(yascheduler_core::NodeIp) -> Option<Arc<dyn yascheduler_remote::Machine>> + Send + Sync> =
        Arc::new(move |ip| pool_for_closure.get(ip));

    let period = tick_period(&engines);

    let reconciler = Arc::new(Reconciler::new(
        Arc::clone(&repo),
        Arc::clone(&engines),
        machines_fn,
        new_node_locks(),
        webhook,
        config.local.engines_dir.clone(),
        config.local.tasks_dir(),
        config.remote.engines_dir.clone(),
        config.remote.tasks_dir.clone(),
        Arc::clone(&allocate),
        consume,
    ));

    // `allocate_limit`/`allocate_pending` governs both task assignment
    // (reconciler) and node creation (coordinator) per §5 — one shared
    // semaphore, not two independently sized ones.
    let providers = cloud_adapters::build_providers(&config.clouds_by_priority());
    let cooloff = period * config.local.cloud_error_cooloff.max(1);
    let coordinator = Arc::new(CloudCoordinator::new(
        Arc::clone(&repo),
        providers,
        allocate,
        deallocate,
        cooloff,
        yascheduler_core::SystemClock,
    ));
    info!(period_secs = period.as_secs(), "daemon ready");
    println!("READY");

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut ticker = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                pool.sync(repo.as_ref()).await;
                reconciler.tick().await;
                coordinator.tick().await;
            }
            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                break;
            }
            _ = sigint.recv() => {
                info!("received SIGINT, shutting down");
                break;
            }
        }
    }

    info!("daemon stopped");
    Ok(())
}

/// Tick period is the minimum of every configured engine's
/// `sleep_interval` (§4.6 "period ≈ minimum engine sleep_interval"),
/// falling back to a sane default when no engines are configured.
fn tick_period(engines: &std::collections::HashMap<yascheduler_core::EngineName, yascheduler_core::EngineDef>) -> Duration {
    engines.values().map(|e| e.sleep_interval).min().unwrap_or(Duration::from_secs(30))
}
