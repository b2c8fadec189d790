// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciflow contributors

//! Artifact and report collection
//!
//! Gathers job outputs and forwards them to a sink. Uploads are
//! fire-and-forget by default: a tolerant sink failure is logged and
//! never changes what the steps decided.

mod filesystem;

pub use filesystem::FilesystemSink;

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::errors::CiflowError;
use crate::runner::JobContext;
use crate::workflow::{ArtifactSpec, ReportSpec, Workflow};

/// Destination for artifacts and reports
#[async_trait]
pub trait Sink: Send + Sync {
    /// Upload one file under a per-job key; returns the stored location
    ///
    /// Tags are free-form labels forwarded with report files; artifact
    /// uploads pass an empty map.
    async fn upload(
        &self,
        job_id: &str,
        name: &str,
        path: &Path,
        tags: &HashMap<String, String>,
    ) -> Result<PathBuf, CiflowError>;
}

/// What collection produced for one job
#[derive(Debug, Default)]
pub struct CollectionOutcome {
    /// Locations the sink stored
    pub stored: Vec<PathBuf>,
    /// Non-tolerant upload failures; these fail the run
    pub failures: Vec<String>,
}

/// Collects artifacts and reports after each job
pub struct Collector {
    sink: Box<dyn Sink>,
    artifacts: Vec<ArtifactSpec>,
    reports: Vec<ReportSpec>,
    working_dir: PathBuf,
}

impl Collector {
    pub fn new(sink: Box<dyn Sink>, workflow: &Workflow, working_dir: PathBuf) -> Self {
        Self {
            sink,
            artifacts: workflow.artifacts.clone(),
            reports: workflow.reports.clone(),
            working_dir,
        }
    }

    /// Collect everything whose condition holds for this job
    pub async fn collect(&self, ctx: &JobContext, job_succeeded: bool) -> CollectionOutcome {
        let mut outcome = CollectionOutcome::default();
        let job_id = ctx.spec().id.clone();
        let no_tags = HashMap::new();

        for artifact in &self.artifacts {
            if !artifact.when.holds(job_succeeded) {
                continue;
            }

            let pattern = ctx.interpolate(&artifact.path);
            match self.resolve_pattern(&pattern) {
                Ok(files) => {
                    for file in files {
                        self.upload_one(
                            &job_id,
                            &artifact.name,
                            &file,
                            &no_tags,
                            artifact.continue_on_error,
                            &mut outcome,
                        )
                        .await;
                    }
                }
                Err(e) => {
                    Self::record_failure(&artifact.name, e, artifact.continue_on_error, &mut outcome)
                }
            }
        }

        for report in &self.reports {
            if !report.when.holds(job_succeeded) {
                continue;
            }

            let path = self.working_dir.join(ctx.interpolate(&report.path));
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "report".to_string());

            let tags: HashMap<String, String> = report
                .tags
                .iter()
                .map(|(k, v)| (k.clone(), ctx.interpolate(v)))
                .collect();

            if !path.exists() {
                Self::record_failure(
                    &name,
                    CiflowError::NoArtifactFiles {
                        pattern: path.display().to_string(),
                    },
                    report.continue_on_error,
                    &mut outcome,
                );
                continue;
            }

            self.upload_one(
                &job_id,
                &name,
                &path,
                &tags,
                report.continue_on_error,
                &mut outcome,
            )
            .await;
        }

        outcome
    }

    async fn upload_one(
        &self,
        job_id: &str,
        name: &str,
        path: &Path,
        tags: &HashMap<String, String>,
        tolerant: bool,
        outcome: &mut CollectionOutcome,
    ) {
        match self.sink.upload(job_id, name, path, tags).await {
            Ok(stored) => outcome.stored.push(stored),
            Err(e) => Self::record_failure(name, e, tolerant, outcome),
        }
    }

    fn record_failure(
        name: &str,
        error: CiflowError,
        tolerant: bool,
        outcome: &mut CollectionOutcome,
    ) {
        if tolerant {
            warn!(upload = name, error = %error, "upload failed, continuing");
        } else {
            outcome.failures.push(format!("{}: {}", name, error));
        }
    }

    /// Resolve a glob pattern relative to the working directory
    fn resolve_pattern(&self, pattern: &str) -> Result<Vec<PathBuf>, CiflowError> {
        let full_pattern = if Path::new(pattern).is_absolute() {
            pattern.to_string()
        } else {
            self.working_dir.join(pattern).to_string_lossy().to_string()
        };

        let matches: Vec<_> = glob::glob(&full_pattern)?
            .filter_map(Result::ok)
            .collect();

        if matches.is_empty() {
            return Err(CiflowError::NoArtifactFiles {
                pattern: pattern.to_string(),
            });
        }

        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::Matrix;

    /// A sink that always refuses the upload
    struct FailingSink;

    #[async_trait]
    impl Sink for FailingSink {
        async fn upload(
            &self,
            _job_id: &str,
            name: &str,
            _path: &Path,
            _tags: &HashMap<String, String>,
        ) -> Result<PathBuf, CiflowError> {
            Err(CiflowError::SinkUpload {
                name: name.to_string(),
                message: "sink is offline".to_string(),
                help: None,
            })
        }
    }

    fn context() -> JobContext {
        let spec = Matrix::default().expand().remove(0);
        JobContext::new(&spec, &HashMap::new())
    }

    fn workflow_with_artifact(dir: &Path, tolerant: bool) -> Workflow {
        let yaml = format!(
            r#"
name: uploads
artifacts:
  - name: results
    path: "*.xml"
    continue_on_error: {}
"#,
            tolerant
        );
        std::fs::write(dir.join("report.xml"), "<testsuite/>").unwrap();
        Workflow::from_yaml(&yaml).unwrap()
    }

    #[tokio::test]
    async fn test_tolerant_sink_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let workflow = workflow_with_artifact(dir.path(), true);

        let collector =
            Collector::new(Box::new(FailingSink), &workflow, dir.path().to_path_buf());
        let outcome = collector.collect(&context(), true).await;

        assert!(outcome.failures.is_empty());
        assert!(outcome.stored.is_empty());
    }

    #[tokio::test]
    async fn test_non_tolerant_sink_failure_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let workflow = workflow_with_artifact(dir.path(), false);

        let collector =
            Collector::new(Box::new(FailingSink), &workflow, dir.path().to_path_buf());
        let outcome = collector.collect(&context(), true).await;

        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.failures[0].contains("results"));
    }

    #[tokio::test]
    async fn test_on_failure_artifact_skipped_for_succeeded_job() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("report.xml"), "<testsuite/>").unwrap();
        let workflow = Workflow::from_yaml(
            r#"
name: uploads
artifacts:
  - name: results
    path: "*.xml"
    when: on_failure
"#,
        )
        .unwrap();

        let sink = FilesystemSink::new(dir.path().join("store")).unwrap();
        let collector = Collector::new(Box::new(sink), &workflow, dir.path().to_path_buf());

        let outcome = collector.collect(&context(), true).await;
        assert!(outcome.stored.is_empty());

        let outcome = collector.collect(&context(), false).await;
        assert_eq!(outcome.stored.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_pattern_is_tolerated_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let workflow = Workflow::from_yaml(
            r#"
name: uploads
artifacts:
  - name: results
    path: "does-not-exist-*.xml"
"#,
        )
        .unwrap();

        let sink = FilesystemSink::new(dir.path().join("store")).unwrap();
        let collector = Collector::new(Box::new(sink), &workflow, dir.path().to_path_buf());

        let outcome = collector.collect(&context(), true).await;
        assert!(outcome.failures.is_empty());
        assert!(outcome.stored.is_empty());
    }

    #[tokio::test]
    async fn test_report_tags_are_interpolated() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("coverage.xml"), "<coverage/>").unwrap();

        let spec = Matrix::from_axes([("torch-version", vec!["1.10"])])
            .expand()
            .remove(0);
        let ctx = JobContext::new(&spec, &HashMap::new());

        let workflow = Workflow::from_yaml(
            r#"
name: uploads
reports:
  - path: coverage.xml
    tags:
      torch: "${{ matrix.torch-version }}"
"#,
        )
        .unwrap();

        let store = dir.path().join("store");
        let sink = FilesystemSink::new(store.clone()).unwrap();
        let collector = Collector::new(Box::new(sink), &workflow, dir.path().to_path_buf());

        let outcome = collector.collect(&ctx, true).await;
        assert_eq!(outcome.stored.len(), 1);

        let tags_file = store.join(&spec.id).join("coverage").join("tags.json");
        let tags: HashMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(tags_file).unwrap()).unwrap();
        assert_eq!(tags["torch"], "1.10");
    }
}
