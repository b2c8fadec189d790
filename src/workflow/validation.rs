// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciflow contributors

//! Workflow validation
//!
//! Validates workflow configuration before execution.

use std::collections::HashSet;

use crate::workflow::{StepWhen, Workflow};

/// Workflow validator
pub struct WorkflowValidator;

impl WorkflowValidator {
    /// Validate a workflow configuration
    pub fn validate(workflow: &Workflow) -> ValidationResult {
        let mut result = ValidationResult::new();

        // A job with zero steps succeeds trivially; legal but worth flagging
        if workflow.steps.is_empty() {
            result.add_warning("Workflow has no steps; every job will succeed trivially");
        }

        // Duplicate step names are harmless (artifacts key off the job id)
        // but usually accidental
        let mut seen_names = HashSet::new();
        for step in &workflow.steps {
            if !seen_names.insert(&step.name) {
                result.add_warning(&format!("Duplicate step name: '{}'", step.name));
            }
        }

        for step in &workflow.steps {
            if step.run.trim().is_empty() {
                result.add_error(&format!("Step '{}': command is empty", step.name));
            }

            if step.when == StepWhen::Failure && step.continue_on_error {
                result.add_warning(&format!(
                    "Step '{}': 'if: failure' combined with continue_on_error; \
                     the step can neither gate nor fail the job",
                    step.name
                ));
            }
        }

        Self::validate_triggers(workflow, &mut result);
        Self::validate_matrix(workflow, &mut result);
        Self::validate_uploads(workflow, &mut result);

        result
    }

    /// Check branch patterns are valid globs
    fn validate_triggers(workflow: &Workflow, result: &mut ValidationResult) {
        for (kind, rule) in workflow.on.rules() {
            for pattern in &rule.branches {
                if let Err(e) = glob::Pattern::new(pattern) {
                    result.add_error(&format!(
                        "Trigger '{}': invalid branch pattern '{}': {}",
                        kind, pattern, e
                    ));
                }
            }
        }
    }

    /// Check every axis has at least one value
    fn validate_matrix(workflow: &Workflow, result: &mut ValidationResult) {
        for axis in workflow.matrix.axes() {
            if axis.values.is_empty() {
                result.add_error(&format!(
                    "Matrix axis '{}' has no values; the matrix expands to zero jobs",
                    axis.name
                ));
            }
        }
    }

    /// Check artifact and report specifications
    fn validate_uploads(workflow: &Workflow, result: &mut ValidationResult) {
        let mut seen_artifacts = HashSet::new();

        for artifact in &workflow.artifacts {
            if artifact.name.is_empty() {
                result.add_error("Artifact with empty name");
            } else if !seen_artifacts.insert(&artifact.name) {
                result.add_error(&format!("Duplicate artifact name: '{}'", artifact.name));
            }

            if artifact.path.is_empty() {
                result.add_error(&format!("Artifact '{}': path is empty", artifact.name));
            } else if let Err(e) = glob::Pattern::new(&artifact.path) {
                result.add_error(&format!(
                    "Artifact '{}': invalid path pattern '{}': {}",
                    artifact.name, artifact.path, e
                ));
            }
        }

        for report in &workflow.reports {
            if report.path.is_empty() {
                result.add_error("Report with empty path");
            }
        }
    }
}

/// Result of workflow validation
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    pub fn add_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::Workflow;

    #[test]
    fn test_zero_steps_is_valid_with_warning() {
        let workflow = Workflow::from_yaml("name: empty").unwrap();

        let result = WorkflowValidator::validate(&workflow);
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.contains("no steps")));
    }

    #[test]
    fn test_empty_command_is_an_error() {
        let yaml = r#"
name: bad
steps:
  - name: broken
    run: "  "
"#;
        let workflow = Workflow::from_yaml(yaml).unwrap();

        let result = WorkflowValidator::validate(&workflow);
        assert!(!result.is_valid());
        assert!(result.errors[0].contains("command is empty"));
    }

    #[test]
    fn test_duplicate_step_names_warn() {
        let yaml = r#"
name: dups
steps:
  - name: test
    run: "echo one"
  - name: test
    run: "echo two"
"#;
        let workflow = Workflow::from_yaml(yaml).unwrap();

        let result = WorkflowValidator::validate(&workflow);
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.contains("Duplicate step name")));
    }

    #[test]
    fn test_invalid_branch_pattern_is_an_error() {
        let yaml = r#"
name: bad-trigger
on:
  push:
    branches: ["release/[*"]
steps:
  - name: test
    run: "true"
"#;
        let workflow = Workflow::from_yaml(yaml).unwrap();

        let result = WorkflowValidator::validate(&workflow);
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.contains("invalid branch pattern")));
    }

    #[test]
    fn test_empty_matrix_axis_is_an_error() {
        let yaml = r#"
name: bad-matrix
matrix:
  python-version: []
steps:
  - name: test
    run: "true"
"#;
        let workflow = Workflow::from_yaml(yaml).unwrap();

        let result = WorkflowValidator::validate(&workflow);
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.contains("has no values")));
    }

    #[test]
    fn test_duplicate_artifact_names_error() {
        let yaml = r#"
name: dup-artifacts
steps:
  - name: test
    run: "true"
artifacts:
  - name: results
    path: "a.xml"
  - name: results
    path: "b.xml"
"#;
        let workflow = Workflow::from_yaml(yaml).unwrap();

        let result = WorkflowValidator::validate(&workflow);
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.contains("Duplicate artifact name")));
    }
}
