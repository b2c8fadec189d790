// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciflow contributors

//! ciflow - Minimal CI Workflow Runner
//!
//! Match triggers, expand the build matrix, run steps, collect artifacts.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ciflow::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ciflow=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    // Change to specified directory if provided
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    // Dispatch to command handlers
    match cli.command {
        Commands::Run {
            workflow,
            event,
            branch,
            job,
            dry_run,
        } => ciflow::cli::run::run(workflow, event, branch, job, dry_run, cli.verbose).await,
        Commands::Validate { workflow } => {
            ciflow::cli::validate::run(workflow, cli.verbose).await
        }
        Commands::Jobs { workflow, format } => {
            ciflow::cli::jobs::run(workflow, format, cli.verbose).await
        }
    }
}
