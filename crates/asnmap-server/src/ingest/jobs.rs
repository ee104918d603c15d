//! In-process ingestion job registry
//!
//! Jobs are tracked from submission to completion so callers of the
//! fire-and-forget HTTP endpoint can poll for the final report. The registry
//! lives as long as the process; it is not persisted. Only the most recent
//! finished jobs are retained; queued and running jobs are never dropped.

use std::collections::HashMap;
use std::sync::Arc;

use asnmap_common::types::EntityKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::report::IngestionReport;
use crate::config::DEFAULT_MAX_RETAINED_JOBS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// One ingestion job and, once finished, its report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionJob {
    pub job_id: Uuid,
    pub kind: EntityKind,
    pub path: String,
    pub status: JobStatus,
    pub submitted_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<IngestionReport>,
}

impl IngestionJob {
    pub fn new(kind: EntityKind, path: impl Into<String>) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            kind,
            path: path.into(),
            status: JobStatus::Queued,
            submitted_at: Utc::now(),
            started_at: None,
            finished_at: None,
            report: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<Uuid, IngestionJob>>>,
    max_finished: usize,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_RETAINED_JOBS)
    }
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry keeping at most `max_finished` finished jobs
    pub fn with_capacity(max_finished: usize) -> Self {
        Self {
            jobs: Arc::default(),
            max_finished,
        }
    }

    /// Register a queued job and return a snapshot of it.
    pub async fn register(&self, kind: EntityKind, path: impl Into<String>) -> IngestionJob {
        let job = IngestionJob::new(kind, path);
        self.jobs.write().await.insert(job.job_id, job.clone());
        job
    }

    pub async fn mark_running(&self, job_id: Uuid) {
        if let Some(job) = self.jobs.write().await.get_mut(&job_id) {
            job.status = JobStatus::Running;
            job.started_at = Some(Utc::now());
        }
    }

    /// Attach the report; a failed report fails the job.
    pub async fn finish(&self, job_id: Uuid, report: IngestionReport) {
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.get_mut(&job_id) {
            job.status = if report.is_failed() {
                JobStatus::Failed
            } else {
                JobStatus::Completed
            };
            job.finished_at = report.finished_at.or_else(|| Some(Utc::now()));
            job.report = Some(report);
        }
        evict_finished(&mut jobs, self.max_finished);
    }

    pub async fn get(&self, job_id: Uuid) -> Option<IngestionJob> {
        self.jobs.read().await.get(&job_id).cloned()
    }

    /// All jobs, most recently submitted first
    pub async fn list(&self) -> Vec<IngestionJob> {
        let mut jobs: Vec<_> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        jobs
    }
}

/// Drop the oldest finished jobs until at most `keep` remain.
fn evict_finished(jobs: &mut HashMap<Uuid, IngestionJob>, keep: usize) {
    let mut finished: Vec<(DateTime<Utc>, Uuid)> = jobs
        .values()
        .filter(|job| job.status.is_finished())
        .map(|job| (job.finished_at.unwrap_or(job.submitted_at), job.job_id))
        .collect();
    if finished.len() <= keep {
        return;
    }

    finished.sort();
    let excess = finished.len() - keep;
    for (_, job_id) in finished.into_iter().take(excess) {
        jobs.remove(&job_id);
    }
    debug!(evicted = excess, "Dropped finished ingestion jobs");
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::path::Path;

    #[tokio::test]
    async fn test_job_lifecycle() {
        let registry = JobRegistry::new();
        let job = registry.register(EntityKind::Category, "categories.csv").await;
        assert_eq!(job.status, JobStatus::Queued);

        registry.mark_running(job.job_id).await;
        let running = registry.get(job.job_id).await.unwrap();
        assert_eq!(running.status, JobStatus::Running);
        assert!(running.started_at.is_some());

        let report = IngestionReport::start(EntityKind::Category, Path::new("categories.csv")).finish();
        registry.finish(job.job_id, report).await;

        let done = registry.get(job.job_id).await.unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert!(done.status.is_finished());
        assert!(done.report.is_some());
    }

    #[tokio::test]
    async fn test_failed_report_fails_job() {
        let registry = JobRegistry::new();
        let job = registry.register(EntityKind::Organization, "orgs.json").await;
        let report =
            IngestionReport::start(EntityKind::Organization, Path::new("orgs.json")).fail("bad json");
        registry.finish(job.job_id, report).await;

        assert_eq!(registry.get(job.job_id).await.unwrap().status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn test_oldest_finished_jobs_are_dropped() {
        let registry = JobRegistry::with_capacity(2);
        let pending = registry.register(EntityKind::Category, "pending.csv").await;

        let mut finished = Vec::new();
        for name in ["a.csv", "b.csv", "c.csv"] {
            let job = registry.register(EntityKind::Category, name).await;
            let report = IngestionReport::start(EntityKind::Category, Path::new(name)).finish();
            registry.finish(job.job_id, report).await;
            finished.push(job.job_id);
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        assert!(registry.get(finished[0]).await.is_none());
        assert!(registry.get(finished[1]).await.is_some());
        assert!(registry.get(finished[2]).await.is_some());
        assert_eq!(registry.get(pending.job_id).await.unwrap().status, JobStatus::Queued);
        assert_eq!(registry.list().await.len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_job_is_none() {
        let registry = JobRegistry::new();
        assert!(registry.get(Uuid::new_v4()).await.is_none());
        registry.mark_running(Uuid::new_v4()).await;
        assert!(registry.list().await.is_empty());
    }
}
