// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciflow contributors

//! Jobs command - list the expanded matrix jobs

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::OutputFormat;
use crate::workflow::Workflow;

/// Run the jobs command
pub async fn run(workflow_path: PathBuf, format: OutputFormat, verbose: bool) -> Result<()> {
    if !workflow_path.exists() {
        return Err(miette::miette!(
            "Workflow file not found: {}",
            workflow_path.display()
        ));
    }

    let workflow = Workflow::from_file(&workflow_path)
        .map_err(|e| miette::miette!("Failed to load workflow: {}", e))?;

    let specs = workflow.matrix.expand();

    match format {
        OutputFormat::Json => {
            let jobs: Vec<serde_json::Value> = specs
                .iter()
                .map(|spec| {
                    serde_json::json!({
                        "id": spec.id,
                        "values": spec
                            .values
                            .iter()
                            .map(|(axis, value)| {
                                serde_json::json!({ "axis": axis, "value": value })
                            })
                            .collect::<Vec<_>>(),
                    })
                })
                .collect();

            let output = serde_json::json!({
                "workflow": workflow.name,
                "jobs": jobs,
            });

            println!("{}", serde_json::to_string_pretty(&output).map_err(|e| {
                miette::miette!("Failed to serialize jobs: {}", e)
            })?);
        }
        OutputFormat::Text => {
            println!();
            println!("{}: {}", "Workflow".bold(), workflow.name);
            println!(
                "{} job{}:",
                specs.len(),
                if specs.len() == 1 { "" } else { "s" }
            );
            println!();

            for (i, spec) in specs.iter().enumerate() {
                println!(
                    "  {}. {} {}",
                    i + 1,
                    spec.id.bold(),
                    spec.display_name().dimmed()
                );

                if verbose {
                    for (axis, value) in &spec.values {
                        println!("       {} = {}", axis.dimmed(), value);
                    }
                }
            }

            println!();
        }
    }

    Ok(())
}
