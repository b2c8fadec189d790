// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciflow contributors

//! Validate command - check workflow configuration

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use crate::workflow::{Workflow, WorkflowValidator};

/// Run the validate command
pub async fn run(workflow_path: PathBuf, verbose: bool) -> Result<()> {
    println!("{}", "Validating workflow...".bold());
    println!();

    // Check workflow exists
    if !workflow_path.exists() {
        return Err(miette::miette!(
            "Workflow file not found: {}\n\n\
             Create a .ciflow.yaml file or pass a path.",
            workflow_path.display()
        ));
    }

    // Load workflow
    let workflow = match Workflow::from_file(&workflow_path) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("  {} Failed to parse workflow", "✗".red());
            eprintln!();
            return Err(miette::miette!("Parse error: {}", e));
        }
    };

    println!("  {} Workflow file is valid YAML", "✓".green());

    // Validate workflow structure
    let validation = WorkflowValidator::validate(&workflow);

    let mut has_issues = false;

    if !validation.errors.is_empty() {
        has_issues = true;
        println!();
        println!("{}:", "Errors".red().bold());
        for error in &validation.errors {
            println!("  {} {}", "✗".red(), error);
        }
    }

    if !validation.warnings.is_empty() {
        println!();
        println!("{}:", "Warnings".yellow().bold());
        for warning in &validation.warnings {
            println!("  {} {}", "⚠".yellow(), warning);
        }
    }

    if verbose {
        println!();
        println!("{}:", "Workflow summary".bold());
        println!("  Name: {}", workflow.name);
        println!("  Jobs: {}", workflow.matrix.expand().len());
        println!("  Steps: {}", workflow.steps.len());
        for step in &workflow.steps {
            let mut notes = Vec::new();
            if step.when != crate::workflow::StepWhen::Success {
                notes.push(format!("if: {}", step.when));
            }
            if step.continue_on_error {
                notes.push("best-effort".to_string());
            }
            let suffix = if notes.is_empty() {
                String::new()
            } else {
                format!(" [{}]", notes.join(", "))
            };
            println!("    - {}{}", step.name, suffix.dimmed());
        }
    }

    println!();

    if has_issues {
        if validation.is_valid() {
            println!("{}", "Workflow is valid but has warnings.".yellow().bold());
            Ok(())
        } else {
            Err(miette::miette!("Workflow validation failed"))
        }
    } else {
        println!("{}", "Workflow is valid!".green().bold());
        Ok(())
    }
}
