use crate::error::AppError;
use crate::features::shared::parse_job_id;
use crate::ingest::{IngestionJob, JobRegistry};

#[tracing::instrument(skip(jobs))]
pub async fn handle(jobs: &JobRegistry, job_id: &str) -> Result<IngestionJob, AppError> {
    let id = parse_job_id(job_id)?;
    jobs.get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Ingestion job {id} not found")))
}
