// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciflow contributors

//! Job execution context
//!
//! Holds the merged environment for one job and performs `${{ ... }}`
//! placeholder interpolation into step commands, env values, artifact
//! paths, and report tags.

use regex::Regex;
use std::collections::HashMap;
use tracing::warn;

use crate::workflow::{JobSpec, Step};

/// Interpolation context for one matrix job
///
/// Supported placeholders:
/// - `${{ matrix.<axis> }}` - the job's value for a matrix axis
/// - `${{ env.<name> }}` - merged workflow environment
/// - `${{ secrets.<name> }}` - process environment of the runner
/// - `${{ os }}` - host OS identifier
#[derive(Debug, Clone)]
pub struct JobContext {
    spec: JobSpec,
    env: HashMap<String, String>,
    os: String,
    placeholder: Regex,
}

impl JobContext {
    /// Build the context for a job from the workflow-global environment
    pub fn new(spec: &JobSpec, global_env: &HashMap<String, String>) -> Self {
        let mut ctx = Self {
            spec: spec.clone(),
            env: HashMap::new(),
            os: std::env::consts::OS.to_string(),
            placeholder: Regex::new(r"\$\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}")
                .expect("placeholder regex is valid"),
        };

        // Global env values may themselves reference matrix/os/secrets
        ctx.env = global_env
            .iter()
            .map(|(k, v)| (k.clone(), ctx.interpolate(v)))
            .collect();

        ctx
    }

    /// The job spec this context belongs to
    pub fn spec(&self) -> &JobSpec {
        &self.spec
    }

    /// Merged environment exported to step processes
    pub fn env(&self) -> &HashMap<String, String> {
        &self.env
    }

    /// Environment for one step: global env with step env layered on top
    pub fn step_env(&self, step: &Step) -> HashMap<String, String> {
        let mut env = self.env.clone();
        for (k, v) in &step.env {
            env.insert(k.clone(), self.interpolate(v));
        }
        env
    }

    /// Replace every `${{ ... }}` placeholder in the input
    ///
    /// Unresolvable placeholders become the empty string; leaving the
    /// literal text in a shell command would execute garbage.
    pub fn interpolate(&self, input: &str) -> String {
        self.placeholder
            .replace_all(input, |caps: &regex::Captures| {
                let key = &caps[1];
                match self.resolve(key) {
                    Some(value) => value,
                    None => {
                        warn!(placeholder = key, "unresolved placeholder, substituting empty string");
                        String::new()
                    }
                }
            })
            .into_owned()
    }

    fn resolve(&self, key: &str) -> Option<String> {
        if key == "os" {
            return Some(self.os.clone());
        }

        if let Some(axis) = key.strip_prefix("matrix.") {
            return self.spec.get(axis).map(str::to_string);
        }

        if let Some(name) = key.strip_prefix("env.") {
            return self.env.get(name).cloned();
        }

        if let Some(name) = key.strip_prefix("secrets.") {
            return std::env::var(name).ok();
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::Matrix;

    fn spec() -> JobSpec {
        Matrix::from_axes([
            ("python-version", vec!["3.8"]),
            ("torch-version", vec!["1.10"]),
        ])
        .expand()
        .remove(0)
    }

    #[test]
    fn test_matrix_interpolation() {
        let ctx = JobContext::new(&spec(), &HashMap::new());

        assert_eq!(
            ctx.interpolate("pip install torch==${{ matrix.torch-version }}"),
            "pip install torch==1.10"
        );
    }

    #[test]
    fn test_env_interpolation() {
        let mut env = HashMap::new();
        env.insert("CACHE_DIR".to_string(), "/tmp/cache".to_string());
        let ctx = JobContext::new(&spec(), &env);

        assert_eq!(ctx.interpolate("ls ${{ env.CACHE_DIR }}"), "ls /tmp/cache");
    }

    #[test]
    fn test_env_values_may_reference_matrix() {
        let mut env = HashMap::new();
        env.insert(
            "REPORT".to_string(),
            "report-${{ matrix.torch-version }}.xml".to_string(),
        );
        let ctx = JobContext::new(&spec(), &env);

        assert_eq!(ctx.env()["REPORT"], "report-1.10.xml");
    }

    #[test]
    fn test_os_interpolation() {
        let ctx = JobContext::new(&spec(), &HashMap::new());

        assert_eq!(ctx.interpolate("${{ os }}"), std::env::consts::OS);
    }

    #[test]
    fn test_unresolved_placeholder_becomes_empty() {
        let ctx = JobContext::new(&spec(), &HashMap::new());

        assert_eq!(ctx.interpolate("x${{ matrix.missing }}y"), "xy");
        assert_eq!(ctx.interpolate("x${{ nonsense }}y"), "xy");
    }

    #[test]
    fn test_step_env_overrides_global() {
        let mut global = HashMap::new();
        global.insert("MODE".to_string(), "global".to_string());

        let step: Step = serde_yaml::from_str(
            r#"
name: test
run: "true"
env:
  MODE: step
"#,
        )
        .unwrap();

        let ctx = JobContext::new(&spec(), &global);
        assert_eq!(ctx.step_env(&step)["MODE"], "step");
    }
}
