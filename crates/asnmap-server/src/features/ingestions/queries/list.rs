use crate::ingest::{IngestionJob, JobRegistry};

/// Every job known to this process, newest first
pub async fn handle(jobs: &JobRegistry) -> Vec<IngestionJob> {
    jobs.list().await
}
