// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ciflow contributors

//! Filesystem-based sink
//!
//! Stores uploads under `<store>/<job-id>/<name>/`, one directory per
//! job so parallel jobs never collide.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::Sink;
use crate::errors::CiflowError;

/// Sink writing into a local store directory
pub struct FilesystemSink {
    store_dir: PathBuf,
}

impl FilesystemSink {
    /// Create a new filesystem sink
    pub fn new(store_dir: PathBuf) -> Result<Self, CiflowError> {
        if !store_dir.exists() {
            std::fs::create_dir_all(&store_dir).map_err(|e| CiflowError::FileWriteError {
                path: store_dir.clone(),
                error: e.to_string(),
            })?;
        }

        Ok(Self { store_dir })
    }

    fn upload_error(name: &str, message: String) -> CiflowError {
        CiflowError::SinkUpload {
            name: name.to_string(),
            message,
            help: None,
        }
    }
}

#[async_trait]
impl Sink for FilesystemSink {
    async fn upload(
        &self,
        job_id: &str,
        name: &str,
        path: &Path,
        tags: &HashMap<String, String>,
    ) -> Result<PathBuf, CiflowError> {
        let dest_dir = self.store_dir.join(job_id).join(name);
        tokio::fs::create_dir_all(&dest_dir)
            .await
            .map_err(|e| Self::upload_error(name, e.to_string()))?;

        let file_name = path
            .file_name()
            .ok_or_else(|| Self::upload_error(name, format!("not a file: {}", path.display())))?;

        let dest = dest_dir.join(file_name);
        tokio::fs::copy(path, &dest)
            .await
            .map_err(|e| Self::upload_error(name, e.to_string()))?;

        if !tags.is_empty() {
            let tags_json = serde_json::to_string_pretty(tags)
                .map_err(|e| Self::upload_error(name, e.to_string()))?;
            tokio::fs::write(dest_dir.join("tags.json"), tags_json)
                .await
                .map_err(|e| Self::upload_error(name, e.to_string()))?;
        }

        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_copies_into_job_keyed_directory() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("report.xml");
        std::fs::write(&source, "<testsuite/>").unwrap();

        let sink = FilesystemSink::new(dir.path().join("store")).unwrap();
        let stored = sink
            .upload("3.8-1.10", "test-results", &source, &HashMap::new())
            .await
            .unwrap();

        assert_eq!(
            stored,
            dir.path()
                .join("store")
                .join("3.8-1.10")
                .join("test-results")
                .join("report.xml")
        );
        assert!(stored.exists());
    }

    #[tokio::test]
    async fn test_distinct_jobs_store_separately() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("report.xml");
        std::fs::write(&source, "<testsuite/>").unwrap();

        let sink = FilesystemSink::new(dir.path().join("store")).unwrap();
        let a = sink
            .upload("1.7", "results", &source, &HashMap::new())
            .await
            .unwrap();
        let b = sink
            .upload("1.8", "results", &source, &HashMap::new())
            .await
            .unwrap();

        assert_ne!(a, b);
        assert!(a.exists());
        assert!(b.exists());
    }

    #[tokio::test]
    async fn test_missing_source_is_an_upload_error() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FilesystemSink::new(dir.path().join("store")).unwrap();

        let result = sink
            .upload(
                "default",
                "results",
                &dir.path().join("missing.xml"),
                &HashMap::new(),
            )
            .await;

        assert!(matches!(result, Err(CiflowError::SinkUpload { .. })));
    }
}
