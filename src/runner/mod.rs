// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciflow contributors

//! Job and workflow execution
//!
//! Runs the steps of each expanded matrix job sequentially, and the jobs
//! themselves concurrently. Step outcomes are tagged results, never
//! panics: a failing external command is data, not an exception.

mod context;
mod executor;
mod job;
mod shell;

pub use context::JobContext;
pub use executor::{ExecutionOptions, WorkflowExecutor, WorkflowResult};
pub use job::JobRunner;

use std::path::PathBuf;
use std::time::Duration;

/// Outcome of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Command ran and exited zero
    Success,
    /// Command ran and exited non-zero, or could not be spawned
    Failure,
    /// Step was gated off by its condition or by cancellation
    Skipped,
}

/// Record of one step within a job
#[derive(Debug, Clone)]
pub struct StepReport {
    /// Step name
    pub name: String,
    /// What happened
    pub outcome: StepOutcome,
    /// Exit code, when the command ran
    pub exit_code: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
    /// Wall-clock duration of the command
    pub duration: Duration,
    /// Whether the step was best-effort (continue_on_error)
    pub best_effort: bool,
}

impl StepReport {
    /// A step that never ran
    pub fn skipped(name: &str) -> Self {
        Self {
            name: name.to_string(),
            outcome: StepOutcome::Skipped,
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            duration: Duration::ZERO,
            best_effort: false,
        }
    }
}

/// Why a job failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// A required step failed
    Step { step: String },
    /// The job exceeded its wall-clock timeout
    Timeout,
    /// A non-tolerant artifact or report upload failed
    Upload { message: String },
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Step { step } => write!(f, "step '{}' failed", step),
            Self::Timeout => write!(f, "timeout exceeded"),
            Self::Upload { message } => write!(f, "upload failed: {}", message),
        }
    }
}

/// Terminal status of a job
///
/// Lifecycle is Pending -> Running -> Succeeded | Failed; only the
/// terminal states are recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Succeeded,
    Failed,
}

/// Result of executing one matrix job
#[derive(Debug, Clone)]
pub struct JobResult {
    /// Id of the job spec this result belongs to
    pub job_id: String,
    /// Terminal status
    pub status: JobStatus,
    /// Why the job failed, if it did
    pub failure: Option<FailureReason>,
    /// Per-step records, in step declaration order
    pub steps: Vec<StepReport>,
    /// Paths stored by the collector for this job
    pub artifacts: Vec<PathBuf>,
    /// Total wall-clock duration
    pub duration: Duration,
}

impl JobResult {
    /// Whether the job reached `Succeeded`
    pub fn succeeded(&self) -> bool {
        self.status == JobStatus::Succeeded
    }

    /// The report of the first required step that failed, if any
    pub fn first_failed_step(&self) -> Option<&StepReport> {
        self.steps
            .iter()
            .find(|s| s.outcome == StepOutcome::Failure && !s.best_effort)
    }
}
