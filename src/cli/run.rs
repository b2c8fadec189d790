// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciflow contributors

//! Run command - execute the workflow

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use crate::collect::{Collector, FilesystemSink};
use crate::errors::CiflowError;
use crate::runner::{ExecutionOptions, FailureReason, WorkflowExecutor};
use crate::workflow::{Event, EventKind, Workflow, WorkflowValidator};

/// Run the workflow
pub async fn run(
    workflow_path: PathBuf,
    event: Option<String>,
    branch: Option<String>,
    jobs: Vec<String>,
    dry_run: bool,
    verbose: bool,
) -> Result<()> {
    // Check workflow exists
    if !workflow_path.exists() {
        return Err(miette::miette!(
            "Workflow file not found: {}\n\n\
             Create a .ciflow.yaml file or pass --workflow <FILE>.",
            workflow_path.display()
        ));
    }

    // Load workflow
    let workflow = Workflow::from_file(&workflow_path)
        .map_err(|e| miette::miette!("Failed to load workflow: {}", e))?;

    // Trigger matching only applies when an event is supplied; a
    // mismatch is a silent skip with a clean exit, not an error
    if let Some(event_name) = event {
        let branch = branch.unwrap_or_default();

        let matched = match event_name.parse::<EventKind>() {
            Ok(kind) => workflow.on.should_run(&Event::new(kind, branch.as_str())),
            // Unknown event kinds never start a run
            Err(_) => false,
        };

        if !matched {
            println!(
                "{}",
                format!(
                    "Skipping: no trigger matches {} on '{}'",
                    event_name, branch
                )
                .dimmed()
            );
            return Ok(());
        }
    }

    // Validate workflow
    let validation = WorkflowValidator::validate(&workflow);

    if !validation.is_valid() {
        eprintln!("{}", "Workflow validation failed:".red().bold());
        for error in &validation.errors {
            eprintln!("  {} {}", "✗".red(), error);
        }
        return Err(CiflowError::InvalidWorkflow {
            reason: validation.errors.join("; "),
            help: Some("Run 'ciflow validate' for the full report".to_string()),
        }
        .into());
    }

    if validation.has_warnings() && verbose {
        eprintln!("{}", "Workflow warnings:".yellow().bold());
        for warning in &validation.warnings {
            eprintln!("  {} {}", "⚠".yellow(), warning);
        }
        eprintln!();
    }

    let working_dir = std::env::current_dir()
        .map_err(|e| miette::miette!("Failed to get current directory: {}", e))?;

    // Set up the artifact store
    let sink = FilesystemSink::new(working_dir.join(&workflow.store.directory))
        .map_err(|e| miette::miette!("Failed to create artifact store: {}", e))?;
    let collector = Collector::new(Box::new(sink), &workflow, working_dir.clone());

    let executor = WorkflowExecutor::new().with_collector(collector);

    let options = ExecutionOptions {
        dry_run,
        jobs,
        verbose,
    };

    // Execute
    let result = executor
        .execute(&workflow, &working_dir, &options)
        .await
        .map_err(|e| miette::miette!("{}", e))?;

    if !result.success {
        // Show what failed per job
        for job in result.jobs.iter().filter(|j| !j.succeeded()) {
            eprintln!();
            eprintln!(
                "{}",
                format!(
                    "Job '{}' failed: {}",
                    job.job_id,
                    job.failure
                        .as_ref()
                        .map(|f| f.to_string())
                        .unwrap_or_default()
                )
                .red()
                .bold()
            );
            if let Some(step) = job.first_failed_step() {
                if !step.stderr.is_empty() {
                    eprintln!("{}", step.stderr.dimmed());
                }
            }
        }

        // Surface the first failure as the command's error
        if let Some(job) = result.jobs.iter().find(|j| !j.succeeded()) {
            let error = match &job.failure {
                Some(FailureReason::Timeout) => CiflowError::JobTimeout {
                    job: job.job_id.clone(),
                    minutes: workflow.defaults.timeout_minutes,
                },
                Some(FailureReason::Step { step }) => {
                    let stderr = job
                        .first_failed_step()
                        .map(|s| s.stderr.clone())
                        .unwrap_or_default();
                    CiflowError::step_failed_with_help(step, stderr)
                }
                Some(FailureReason::Upload { message }) => CiflowError::ExecutionFailed {
                    message: message.clone(),
                    help: None,
                },
                None => CiflowError::ExecutionFailed {
                    message: format!("job '{}' failed", job.job_id),
                    help: None,
                },
            };
            return Err(error.into());
        }
        return Err(miette::miette!("Workflow execution failed"));
    }

    // Print stored artifacts
    let stored: Vec<_> = result
        .jobs
        .iter()
        .flat_map(|j| j.artifacts.iter())
        .collect();

    if !stored.is_empty() {
        println!();
        println!("{}:", "Collected".bold());
        for path in stored {
            println!("  - {}", path.display());
        }
    }

    Ok(())
}
