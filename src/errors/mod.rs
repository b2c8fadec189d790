// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciflow contributors

//! Error types with diagnostic codes
//!
//! ciflow errors carry miette diagnostic codes and, where useful, a help
//! message pointing at the fix.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for ciflow operations
pub type CiflowResult<T> = Result<T, CiflowError>;

/// Main error type for ciflow
#[derive(Error, Debug, Diagnostic)]
pub enum CiflowError {
    // ─────────────────────────────────────────────────────────────────────────
    // Workflow Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Workflow file not found: {path}")]
    #[diagnostic(
        code(ciflow::workflow_not_found),
        help("Create a .ciflow.yaml workflow file or pass --workflow <FILE>")
    )]
    WorkflowNotFound { path: PathBuf },

    #[error("Invalid workflow configuration: {reason}")]
    #[diagnostic(code(ciflow::invalid_workflow))]
    InvalidWorkflow {
        reason: String,
        #[help]
        help: Option<String>,
    },

    #[error("Job '{job}' not found in matrix")]
    #[diagnostic(
        code(ciflow::job_not_found),
        help("Run 'ciflow jobs' to list the expanded job ids")
    )]
    JobNotFound { job: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Execution Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Step '{step}' failed")]
    #[diagnostic(code(ciflow::step_failed))]
    StepFailed {
        step: String,
        stderr: String,
        #[help]
        help: Option<String>,
    },

    #[error("Job '{job}' exceeded its timeout of {minutes} minute(s)")]
    #[diagnostic(
        code(ciflow::job_timeout),
        help("Raise defaults.timeout_minutes in the workflow file if the job legitimately needs longer")
    )]
    JobTimeout { job: String, minutes: u64 },

    #[error("Execution failed: {message}")]
    #[diagnostic(code(ciflow::execution_failed))]
    ExecutionFailed {
        message: String,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Collection Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Upload of '{name}' failed: {message}")]
    #[diagnostic(code(ciflow::sink_upload_failed))]
    SinkUpload {
        name: String,
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("No files matched artifact pattern: {pattern}")]
    #[diagnostic(
        code(ciflow::no_artifact_files),
        help("Check that the step producing '{pattern}' ran and wrote its output")
    )]
    NoArtifactFiles { pattern: String },

    // ─────────────────────────────────────────────────────────────────────────
    // File Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(ciflow::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Failed to write file '{path}': {error}")]
    #[diagnostic(code(ciflow::file_write_error))]
    FileWriteError { path: PathBuf, error: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(ciflow::io_error))]
    Io { message: String },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(ciflow::yaml_error))]
    Yaml { message: String },

    #[error("JSON error: {message}")]
    #[diagnostic(code(ciflow::json_error))]
    Json { message: String },

    #[error("Glob pattern error: {message}")]
    #[diagnostic(code(ciflow::glob_error))]
    GlobPattern { message: String },
}

impl From<std::io::Error> for CiflowError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for CiflowError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for CiflowError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<glob::PatternError> for CiflowError {
    fn from(e: glob::PatternError) -> Self {
        Self::GlobPattern { message: e.to_string() }
    }
}

impl CiflowError {
    /// Create a step failed error with helpful context
    pub fn step_failed_with_help(step: &str, stderr: String) -> Self {
        let help = Self::generate_help_for_step_error(&stderr);
        Self::StepFailed {
            step: step.to_string(),
            stderr,
            help,
        }
    }

    /// Generate suggestions from common shell failure patterns
    fn generate_help_for_step_error(stderr: &str) -> Option<String> {
        if stderr.contains("command not found") {
            Some("A command used by this step is not installed or not in PATH.".into())
        } else if stderr.contains("Permission denied") {
            Some("The step lacks permission for a file or directory it touches.".into())
        } else if stderr.contains("No such file or directory") {
            Some("A file the step expects is missing. Check that earlier steps produced it.".into())
        } else {
            None
        }
    }
}
