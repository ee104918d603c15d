//! Ingestion orchestrator
//!
//! Runs the per-file pipeline either inline (CLI) or as a background task
//! tracked by the [`JobRegistry`] (HTTP). Jobs for different files may run
//! concurrently; the store serializes writes per natural key.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use asnmap_common::types::EntityKind;
use thiserror::Error;
use tracing::{error, info, Instrument};

use super::jobs::{IngestionJob, JobRegistry};
use super::pipeline::{self, IngestOptions};
use super::report::IngestionReport;
use crate::config::IngestConfig;
use crate::store::RecordStore;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Path must not be empty")]
    EmptyPath,

    #[error("Path '{0}' is outside the data directory")]
    OutsideDataDir(String),
}

#[derive(Clone)]
pub struct IngestOrchestrator {
    store: Arc<dyn RecordStore>,
    jobs: JobRegistry,
    data_dir: PathBuf,
    options: IngestOptions,
}

impl IngestOrchestrator {
    pub fn new(store: Arc<dyn RecordStore>, config: &IngestConfig) -> Self {
        Self {
            store,
            jobs: JobRegistry::with_capacity(config.max_retained_jobs),
            data_dir: config.data_dir.clone(),
            options: IngestOptions {
                max_reported_errors: config.max_reported_errors,
            },
        }
    }

    pub fn jobs(&self) -> &JobRegistry {
        &self.jobs
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Resolve a caller-supplied path against the data directory.
    ///
    /// Relative paths are joined to the data directory. Absolute paths must
    /// already lie inside it. `..` components are rejected outright.
    pub fn resolve_path(&self, raw: &str) -> Result<PathBuf, SubmitError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(SubmitError::EmptyPath);
        }

        let requested = Path::new(raw);
        if requested.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(SubmitError::OutsideDataDir(raw.to_string()));
        }

        if requested.is_absolute() {
            if requested.starts_with(&self.data_dir) {
                Ok(requested.to_path_buf())
            } else {
                Err(SubmitError::OutsideDataDir(raw.to_string()))
            }
        } else {
            Ok(self.data_dir.join(requested))
        }
    }

    /// Queue an ingestion job and run it in the background.
    ///
    /// Returns the queued job right away; poll the registry for its report.
    pub async fn submit(&self, kind: EntityKind, raw_path: &str) -> Result<IngestionJob, SubmitError> {
        let path = self.resolve_path(raw_path)?;
        let job = self.jobs.register(kind, path.display().to_string()).await;
        let job_id = job.job_id;

        info!(job_id = %job_id, kind = %kind, path = %path.display(), "Ingestion job queued");

        let this = self.clone();
        let span = tracing::info_span!("ingestion_job", job_id = %job_id, kind = %kind);
        tokio::spawn(
            async move {
                this.jobs.mark_running(job_id).await;
                let report = this.run(kind, &path).await;
                if report.is_failed() {
                    error!(failure = ?report.failure, "Ingestion job failed");
                }
                this.jobs.finish(job_id, report).await;
            }
            .instrument(span),
        );

        Ok(job)
    }

    /// Run one ingestion to completion on the current task.
    pub async fn run(&self, kind: EntityKind, path: &Path) -> IngestionReport {
        pipeline::ingest(self.store.as_ref(), kind, path, &self.options).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ingest::jobs::JobStatus;
    use crate::store::MemoryRecordStore;
    use std::time::Duration;

    fn orchestrator(data_dir: &Path) -> IngestOrchestrator {
        let config = IngestConfig {
            data_dir: data_dir.to_path_buf(),
            max_reported_errors: 10,
            max_retained_jobs: 10,
        };
        IngestOrchestrator::new(Arc::new(MemoryRecordStore::new()), &config)
    }

    #[test]
    fn test_resolve_path_rules() {
        let orch = orchestrator(Path::new("/srv/asnmap/data"));

        assert_eq!(
            orch.resolve_path("as-rel.txt").unwrap(),
            PathBuf::from("/srv/asnmap/data/as-rel.txt")
        );
        assert_eq!(
            orch.resolve_path("/srv/asnmap/data/2024/orgs.json").unwrap(),
            PathBuf::from("/srv/asnmap/data/2024/orgs.json")
        );
        assert!(matches!(orch.resolve_path("../etc/passwd"), Err(SubmitError::OutsideDataDir(_))));
        assert!(matches!(orch.resolve_path("/etc/passwd"), Err(SubmitError::OutsideDataDir(_))));
        assert_eq!(orch.resolve_path("  "), Err(SubmitError::EmptyPath));
    }

    #[tokio::test]
    async fn test_submit_runs_in_background() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("as-rel.txt"), "1|2|0\n1|3|-1\n").unwrap();
        let orch = orchestrator(dir.path());

        let job = orch.submit(EntityKind::Relationship, "as-rel.txt").await.unwrap();
        assert_eq!(job.status, JobStatus::Queued);

        let mut finished = None;
        for _ in 0..100 {
            let current = orch.jobs().get(job.job_id).await.unwrap();
            if current.status.is_finished() {
                finished = Some(current);
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let finished = finished.expect("job did not finish");
        assert_eq!(finished.status, JobStatus::Completed);
        assert_eq!(finished.report.unwrap().records_processed, 2);
        assert!(orch.store().relationship("1").await.unwrap().is_some());
    }
}
