// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `yasubmit`: submit one task. The named engine's `spawn` template was
//! already checked for unrecognized placeholders when its `EngineDef` was
//! constructed at config-load time (§4.6), so loading the config here and
//! rejecting an unknown `--engine` is this binary's entire share of that
//! submission-time validation.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use yascheduler_config::Config;
use yascheduler_core::TaskMetadata;
use yascheduler_storage::{PgRepository, TaskNodeRepository};

#[derive(Parser, Debug)]
#[command(name = "yasubmit")]
struct Args {
    /// Name of a configured `engine.<name>` section.
    #[arg(long)]
    engine: String,

    /// Human-readable label for the task.
    #[arg(long)]
    label: String,

    /// Local file to stage as task input; may be repeated. The remote
    /// name is the file's basename.
    #[arg(long = "input")]
    inputs: Vec<PathBuf>,

    /// Declared output file name; may be repeated.
    #[arg(long = "output")]
    outputs: Vec<String>,

    /// Webhook URL to notify on completion.
    #[arg(long)]
    webhook: Option<String>,

    /// CPU count override; defaults to the claimed node's `ncpus` if unset.
    #[arg(long)]
    ncpus: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::load().context("loading config")?;

    if !config.engines.contains_key(&args.engine) {
        bail!("unknown engine '{}': not present in the loaded config", args.engine);
    }

    let mut input_names = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("input path '{}' has no file name", path.display()))?;
        input_names.push(name.to_string());
    }

    let mut metadata = TaskMetadata::new(args.engine.clone(), input_names, args.outputs);
    metadata.webhook_url = args.webhook;
    metadata.ncpus = args.ncpus;

    let repo = PgRepository::connect(&config.db.connection_url(), 4).await.context("connecting to database")?;
    let task_id = repo.submit(&args.label, metadata).await.context("submitting task")?;

    let task_dir = format!("{}/{}", config.local.tasks_dir().trim_end_matches('/'), task_id);
    tokio::fs::create_dir_all(&task_dir).await.context("creating task input directory")?;
    for (path, name) in args.inputs.iter().zip(&input_names) {
        let dest = format!("{task_dir}/{name}");
        tokio::fs::copy(path, &dest).await.with_context(|| format!("staging input '{}'", path.display()))?;
    }

    println!("{task_id}");
    Ok(())
}
