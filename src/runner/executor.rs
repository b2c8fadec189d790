// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciflow contributors

//! Workflow executor
//!
//! Expands the matrix and runs every job concurrently. Jobs share no
//! mutable state; one job's failure never cancels its siblings.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use colored::Colorize;
use indicatif::MultiProgress;
use tokio::task::JoinSet;

use super::{FailureReason, JobContext, JobResult, JobRunner, JobStatus};
use crate::collect::Collector;
use crate::errors::CiflowError;
use crate::utils::create_spinner;
use crate::workflow::{JobSpec, Workflow};

/// Workflow execution options
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// Only show what would be done
    pub dry_run: bool,
    /// Only run specific job ids
    pub jobs: Vec<String>,
    /// Verbose output
    pub verbose: bool,
}

/// Result of executing a workflow
#[derive(Debug)]
pub struct WorkflowResult {
    /// Per-job results, in matrix expansion order
    pub jobs: Vec<JobResult>,
    /// Total execution time
    pub duration: Duration,
    /// Whether every job succeeded
    pub success: bool,
}

/// Workflow executor
pub struct WorkflowExecutor {
    /// Post-job artifact/report collection
    collector: Option<Arc<Collector>>,
}

impl WorkflowExecutor {
    /// Create a new workflow executor
    pub fn new() -> Self {
        Self { collector: None }
    }

    /// Attach a collector
    pub fn with_collector(mut self, collector: Collector) -> Self {
        self.collector = Some(Arc::new(collector));
        self
    }

    /// Execute a workflow
    pub async fn execute(
        &self,
        workflow: &Workflow,
        working_dir: &Path,
        options: &ExecutionOptions,
    ) -> Result<WorkflowResult, CiflowError> {
        let start = Instant::now();

        let mut specs = workflow.matrix.expand();

        // Filter jobs if specific ones requested
        if !options.jobs.is_empty() {
            for id in &options.jobs {
                if !specs.iter().any(|s| &s.id == id) {
                    return Err(CiflowError::JobNotFound { job: id.clone() });
                }
            }
            specs.retain(|s| options.jobs.contains(&s.id));
        }

        self.print_execution_plan(workflow, &specs);

        if options.dry_run {
            return Ok(WorkflowResult {
                jobs: Vec::new(),
                duration: start.elapsed(),
                success: true,
            });
        }

        let workflow = Arc::new(workflow.clone());
        let multi = MultiProgress::new();
        let mut tasks: JoinSet<(usize, JobResult)> = JoinSet::new();

        for (idx, spec) in specs.into_iter().enumerate() {
            let pb = multi.add(create_spinner(&format!("{} running...", spec.id)));
            let workflow = Arc::clone(&workflow);
            let collector = self.collector.clone();
            let working_dir = working_dir.to_path_buf();

            tasks.spawn(async move {
                let runner = JobRunner::new(Arc::clone(&workflow), working_dir);
                let mut result = runner.run(&spec).await;

                if let Some(collector) = collector {
                    let ctx = JobContext::new(&spec, &workflow.env);
                    let collected = collector.collect(&ctx, result.succeeded()).await;
                    result.artifacts = collected.stored;

                    // A non-tolerant upload failure fails the job; it
                    // never resurrects one the steps already failed.
                    if !collected.failures.is_empty() && result.succeeded() {
                        result.status = JobStatus::Failed;
                        result.failure = Some(FailureReason::Upload {
                            message: collected.failures.join("; "),
                        });
                    }
                }

                if result.succeeded() {
                    pb.finish_with_message(format!(
                        "{} {} ({:.2}s)",
                        "✓".green(),
                        spec.id.bold(),
                        result.duration.as_secs_f64()
                    ));
                } else {
                    let reason = result
                        .failure
                        .as_ref()
                        .map(|f| f.to_string())
                        .unwrap_or_default();
                    pb.finish_with_message(format!(
                        "{} {} ({})",
                        "✗".red(),
                        spec.id.bold(),
                        reason
                    ));
                }

                (idx, result)
            });
        }

        let mut indexed = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(pair) => indexed.push(pair),
                Err(e) => {
                    return Err(CiflowError::ExecutionFailed {
                        message: format!("job task failed: {}", e),
                        help: None,
                    })
                }
            }
        }

        // Results arrive in completion order; report in expansion order
        indexed.sort_by_key(|(idx, _)| *idx);
        let jobs: Vec<JobResult> = indexed.into_iter().map(|(_, result)| result).collect();

        let success = jobs.iter().all(JobResult::succeeded);
        let duration = start.elapsed();

        println!();
        if success {
            println!(
                "{}",
                format!(
                    "Workflow completed successfully in {:.2}s",
                    duration.as_secs_f64()
                )
                .green()
            );
        } else {
            println!(
                "{}",
                format!("Workflow failed after {:.2}s", duration.as_secs_f64()).red()
            );
        }

        Ok(WorkflowResult {
            jobs,
            duration,
            success,
        })
    }

    /// Print the execution plan
    fn print_execution_plan(&self, workflow: &Workflow, specs: &[JobSpec]) {
        println!();
        println!("{}: {}", "Workflow".bold(), workflow.name);
        println!("{}", "═".repeat(50));
        println!(
            "Execution plan ({} job{}, {} step{} each):",
            specs.len(),
            if specs.len() == 1 { "" } else { "s" },
            workflow.steps.len(),
            if workflow.steps.len() == 1 { "" } else { "s" }
        );
        println!();

        for (i, spec) in specs.iter().enumerate() {
            println!(
                "  {}. {} {}",
                i + 1,
                spec.id.bold(),
                spec.display_name().dimmed()
            );
        }

        println!();
    }
}

impl Default for WorkflowExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::FilesystemSink;

    #[tokio::test]
    async fn test_matrix_jobs_run_independently() {
        let dir = tempfile::tempdir().unwrap();
        let workflow = Workflow::from_yaml(
            r#"
name: fanout
matrix:
  tag: ["a", "b"]
steps:
  - name: write
    run: "echo done > out-${{ matrix.tag }}.txt"
"#,
        )
        .unwrap();

        let executor = WorkflowExecutor::new();
        let result = executor
            .execute(&workflow, dir.path(), &ExecutionOptions::default())
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.jobs.len(), 2);
        assert!(dir.path().join("out-a.txt").exists());
        assert!(dir.path().join("out-b.txt").exists());
    }

    #[tokio::test]
    async fn test_one_job_failing_does_not_cancel_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let workflow = Workflow::from_yaml(
            r#"
name: partial
matrix:
  tag: ["good", "bad"]
steps:
  - name: maybe-fail
    run: "test ${{ matrix.tag }} = good && echo ok > out-${{ matrix.tag }}.txt"
"#,
        )
        .unwrap();

        let executor = WorkflowExecutor::new();
        let result = executor
            .execute(&workflow, dir.path(), &ExecutionOptions::default())
            .await
            .unwrap();

        // Overall status is the OR of job failures
        assert!(!result.success);
        assert!(result.jobs.iter().any(|j| j.succeeded()));
        assert!(result.jobs.iter().any(|j| !j.succeeded()));
        assert!(dir.path().join("out-good.txt").exists());
    }

    #[tokio::test]
    async fn test_dry_run_executes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let workflow = Workflow::from_yaml(
            r#"
name: dry
steps:
  - name: write
    run: "echo done > out.txt"
"#,
        )
        .unwrap();

        let options = ExecutionOptions {
            dry_run: true,
            ..Default::default()
        };
        let result = WorkflowExecutor::new()
            .execute(&workflow, dir.path(), &options)
            .await
            .unwrap();

        assert!(result.success);
        assert!(!dir.path().join("out.txt").exists());
    }

    #[tokio::test]
    async fn test_unknown_job_filter_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let workflow = Workflow::from_yaml(
            r#"
name: filter
matrix:
  tag: ["a"]
steps:
  - name: noop
    run: "true"
"#,
        )
        .unwrap();

        let options = ExecutionOptions {
            jobs: vec!["missing".to_string()],
            ..Default::default()
        };
        let result = WorkflowExecutor::new()
            .execute(&workflow, dir.path(), &options)
            .await;

        assert!(matches!(result, Err(CiflowError::JobNotFound { .. })));
    }

    #[tokio::test]
    async fn test_job_filter_runs_only_selected_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let workflow = Workflow::from_yaml(
            r#"
name: filter
matrix:
  tag: ["a", "b"]
steps:
  - name: write
    run: "echo done > out-${{ matrix.tag }}.txt"
"#,
        )
        .unwrap();

        let options = ExecutionOptions {
            jobs: vec!["a".to_string()],
            ..Default::default()
        };
        let result = WorkflowExecutor::new()
            .execute(&workflow, dir.path(), &options)
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.jobs.len(), 1);
        assert!(dir.path().join("out-a.txt").exists());
        assert!(!dir.path().join("out-b.txt").exists());
    }

    #[tokio::test]
    async fn test_collector_failures_fail_the_job() {
        let dir = tempfile::tempdir().unwrap();
        let workflow = Workflow::from_yaml(
            r#"
name: uploads
steps:
  - name: noop
    run: "true"
artifacts:
  - name: required-results
    path: "never-written-*.xml"
    continue_on_error: false
"#,
        )
        .unwrap();

        let sink = FilesystemSink::new(dir.path().join("store")).unwrap();
        let collector = Collector::new(Box::new(sink), &workflow, dir.path().to_path_buf());

        let result = WorkflowExecutor::new()
            .with_collector(collector)
            .execute(&workflow, dir.path(), &ExecutionOptions::default())
            .await
            .unwrap();

        assert!(!result.success);
        assert!(matches!(
            result.jobs[0].failure,
            Some(FailureReason::Upload { .. })
        ));
    }
}
