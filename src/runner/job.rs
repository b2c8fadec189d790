// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciflow contributors

//! Job runner
//!
//! Executes one matrix job: steps strictly in declaration order, a
//! required failure gating the rest, best-effort steps logged but not
//! counted, all bounded by the job's wall-clock timeout.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::context::JobContext;
use super::shell::run_step_command;
use super::{FailureReason, JobResult, JobStatus, StepOutcome, StepReport};
use crate::workflow::{JobSpec, StepWhen, Workflow};

/// Runs the steps of a single job
pub struct JobRunner {
    workflow: Arc<Workflow>,
    working_dir: std::path::PathBuf,
    timeout: Duration,
}

impl JobRunner {
    /// Create a runner with the workflow's configured timeout
    pub fn new(workflow: Arc<Workflow>, working_dir: std::path::PathBuf) -> Self {
        let timeout = workflow.job_timeout();
        Self {
            workflow,
            working_dir,
            timeout,
        }
    }

    /// Override the job timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the job to completion or timeout
    ///
    /// External command failures are data in the result, never errors;
    /// the runner itself only sequences and gates them.
    pub async fn run(&self, spec: &JobSpec) -> JobResult {
        let start = Instant::now();
        let ctx = JobContext::new(spec, &self.workflow.env);

        // Shared with the step loop so a timeout still yields the
        // reports of everything that completed before cancellation.
        let reports = Arc::new(Mutex::new(Vec::with_capacity(self.workflow.steps.len())));

        let outcome = tokio::time::timeout(
            self.timeout,
            self.run_steps(&ctx, Arc::clone(&reports)),
        )
        .await;

        let mut steps = reports
            .lock()
            .expect("step report mutex poisoned")
            .clone();

        match outcome {
            Ok(failed_step) => {
                let failure = failed_step.map(|step| FailureReason::Step { step });
                JobResult {
                    job_id: spec.id.clone(),
                    status: if failure.is_none() {
                        JobStatus::Succeeded
                    } else {
                        JobStatus::Failed
                    },
                    failure,
                    steps,
                    artifacts: Vec::new(),
                    duration: start.elapsed(),
                }
            }
            Err(_) => {
                warn!(job = %spec.id, "job timed out, cancelling");

                // Cancellation wins over always-run steps: everything
                // that has no report yet is recorded as skipped.
                for step in self.workflow.steps.iter().skip(steps.len()) {
                    steps.push(StepReport::skipped(&step.name));
                }

                JobResult {
                    job_id: spec.id.clone(),
                    status: JobStatus::Failed,
                    failure: Some(FailureReason::Timeout),
                    steps,
                    artifacts: Vec::new(),
                    duration: start.elapsed(),
                }
            }
        }
    }

    /// Run steps in declaration order; returns the name of the first
    /// required step that failed, if any
    async fn run_steps(
        &self,
        ctx: &JobContext,
        reports: Arc<Mutex<Vec<StepReport>>>,
    ) -> Option<String> {
        let mut failed_step: Option<String> = None;

        for step in &self.workflow.steps {
            let run_now = match step.when {
                StepWhen::Success => failed_step.is_none(),
                StepWhen::Always => true,
                StepWhen::Failure => failed_step.is_some(),
            };

            if !run_now {
                reports
                    .lock()
                    .expect("step report mutex poisoned")
                    .push(StepReport::skipped(&step.name));
                continue;
            }

            debug!(step = %step.name, "running step");

            let body = ctx.interpolate(&step.run);
            let env = ctx.step_env(step);
            let shell = self.workflow.shell_for(step);

            let output = run_step_command(shell, &body, &self.working_dir, &env).await;

            if !output.success {
                if step.continue_on_error {
                    warn!(step = %step.name, "best-effort step failed, continuing");
                } else if failed_step.is_none() {
                    failed_step = Some(step.name.clone());
                }
            }

            reports
                .lock()
                .expect("step report mutex poisoned")
                .push(StepReport {
                    name: step.name.clone(),
                    outcome: if output.success {
                        StepOutcome::Success
                    } else {
                        StepOutcome::Failure
                    },
                    exit_code: output.exit_code,
                    stdout: output.stdout,
                    stderr: output.stderr,
                    duration: output.duration,
                    best_effort: step.continue_on_error,
                });
        }

        failed_step
    }
}
