// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciflow contributors

//! Workflow definition structures
//!
//! Defines the schema for .ciflow.yaml files.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::workflow::{Matrix, TriggerSet};

/// Workflow definition from .ciflow.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    /// Workflow version (for future compatibility)
    #[serde(default = "default_version")]
    pub version: String,

    /// Workflow name
    pub name: String,

    /// Workflow description
    #[serde(default)]
    pub description: Option<String>,

    /// Trigger rules (event kind -> branch patterns)
    #[serde(rename = "on", default)]
    pub on: TriggerSet,

    /// Build matrix axes
    #[serde(default)]
    pub matrix: Matrix,

    /// Global environment variables
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Job-level defaults
    #[serde(default)]
    pub defaults: Defaults,

    /// Steps in execution order
    #[serde(default)]
    pub steps: Vec<Step>,

    /// Artifacts to collect after each job
    #[serde(default)]
    pub artifacts: Vec<ArtifactSpec>,

    /// Reports to forward after each job
    #[serde(default)]
    pub reports: Vec<ReportSpec>,

    /// Artifact store configuration
    #[serde(default)]
    pub store: StoreConfig,
}

fn default_version() -> String {
    "1".to_string()
}

impl Workflow {
    /// Load workflow from a YAML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, crate::CiflowError> {
        if !path.exists() {
            return Err(crate::CiflowError::WorkflowNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::CiflowError::FileReadError {
                path: path.to_path_buf(),
                error: e.to_string(),
            }
        })?;

        Self::from_yaml(&content)
    }

    /// Parse workflow from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, crate::CiflowError> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    /// Serialize workflow to YAML
    pub fn to_yaml(&self) -> Result<String, crate::CiflowError> {
        serde_yaml::to_string(self).map_err(Into::into)
    }

    /// Get a step by name
    pub fn get_step(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Get all step names
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    /// Shell a step runs under (step override or workflow default)
    pub fn shell_for<'a>(&'a self, step: &'a Step) -> &'a str {
        step.shell.as_deref().unwrap_or(&self.defaults.shell)
    }

    /// Job wall-clock timeout
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.defaults.timeout_minutes * 60)
    }
}

/// A single workflow step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Step name
    pub name: String,

    /// Shell command body (opaque to the runner)
    pub run: String,

    /// Shell override for this step
    #[serde(default)]
    pub shell: Option<String>,

    /// Environment variables for this step
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Condition for running this step
    #[serde(rename = "if", default)]
    pub when: StepWhen,

    /// Step failure does not affect job status (best-effort)
    #[serde(default)]
    pub continue_on_error: bool,
}

/// When a step runs, relative to the job's state so far
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StepWhen {
    /// Run only while no required step has failed (default)
    #[default]
    Success,
    /// Run regardless of prior failures
    Always,
    /// Run only after a required step has failed
    Failure,
}

impl std::fmt::Display for StepWhen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Always => write!(f, "always"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

/// Job-level defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    /// Shell used for steps without an override
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Wall-clock timeout per job, in minutes
    #[serde(default = "default_timeout_minutes")]
    pub timeout_minutes: u64,

    /// Working directory for steps (defaults to the invocation directory)
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            timeout_minutes: default_timeout_minutes(),
            working_dir: None,
        }
    }
}

fn default_shell() -> String {
    "bash".to_string()
}

fn default_timeout_minutes() -> u64 {
    35
}

/// An artifact to upload after a job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactSpec {
    /// Artifact name (unique within the workflow)
    pub name: String,

    /// Glob pattern for the files to upload
    pub path: String,

    /// Condition gating the upload
    #[serde(default)]
    pub when: UploadWhen,

    /// Upload failure does not affect the run (default: tolerant)
    #[serde(default = "default_true")]
    pub continue_on_error: bool,
}

/// A report file to forward after a job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSpec {
    /// Report file path
    pub path: String,

    /// Free-form labels forwarded with the report
    #[serde(default)]
    pub tags: HashMap<String, String>,

    /// Condition gating the upload
    #[serde(default)]
    pub when: UploadWhen,

    /// Upload failure does not affect the run (default: tolerant)
    #[serde(default = "default_true")]
    pub continue_on_error: bool,
}

/// Condition gating an artifact or report upload
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UploadWhen {
    /// Upload whatever the job status (default)
    #[default]
    Always,
    /// Upload only for succeeded jobs
    OnSuccess,
    /// Upload only for failed jobs
    OnFailure,
}

impl UploadWhen {
    /// Whether the condition holds for a job that succeeded/failed
    pub fn holds(&self, job_succeeded: bool) -> bool {
        match self {
            Self::Always => true,
            Self::OnSuccess => job_succeeded,
            Self::OnFailure => !job_succeeded,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Artifact store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store directory
    #[serde(default = "default_store_dir")]
    pub directory: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            directory: default_store_dir(),
        }
    }
}

fn default_store_dir() -> PathBuf {
    PathBuf::from(".ciflow/store")
}
