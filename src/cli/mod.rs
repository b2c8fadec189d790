// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciflow contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for ciflow.

pub mod jobs;
pub mod run;
pub mod validate;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Minimal CI workflow runner
///
/// Match triggers, expand the build matrix, run steps, collect artifacts.
#[derive(Parser, Debug)]
#[clap(
    name = "ciflow",
    version,
    about = "Minimal CI workflow runner: triggers, matrices, steps, artifacts",
    long_about = None,
    after_help = "Examples:\n\
        ciflow run                                  Execute the workflow\n\
        ciflow run --event push --branch master     Run only if the trigger matches\n\
        ciflow jobs                                 List the expanded matrix jobs\n\
        ciflow validate                             Check the workflow file\n\n\
        See 'ciflow <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the workflow
    Run {
        /// Workflow file
        #[clap(short, long, default_value = ".ciflow.yaml")]
        workflow: PathBuf,

        /// Event kind to match against the triggers (push, pull_request)
        #[clap(short, long, requires = "branch")]
        event: Option<String>,

        /// Branch the event targets
        #[clap(short, long)]
        branch: Option<String>,

        /// Run only specific matrix jobs (by id, see 'ciflow jobs')
        #[clap(short, long)]
        job: Vec<String>,

        /// Dry run (show what would be done)
        #[clap(long)]
        dry_run: bool,
    },

    /// Validate workflow configuration
    Validate {
        /// Workflow file to validate
        #[clap(default_value = ".ciflow.yaml")]
        workflow: PathBuf,
    },

    /// List the jobs the matrix expands to
    Jobs {
        /// Workflow file
        #[clap(default_value = ".ciflow.yaml")]
        workflow: PathBuf,

        /// Output format
        #[clap(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Output format for the jobs command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}
