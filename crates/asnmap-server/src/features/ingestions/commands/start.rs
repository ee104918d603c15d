use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::AppError;
use crate::features::shared::parse_entity_kind;
use crate::ingest::{IngestOrchestrator, IngestionJob, SubmitError};

/// `POST /ingestions` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartIngestionCommand {
    pub kind: String,
    pub path: String,
}

#[derive(Debug, Error)]
pub enum StartIngestionError {
    #[error(transparent)]
    InvalidKind(AppError),
    #[error(transparent)]
    InvalidPath(#[from] SubmitError),
}

impl From<StartIngestionError> for AppError {
    fn from(err: StartIngestionError) -> Self {
        match err {
            StartIngestionError::InvalidKind(e) => e,
            StartIngestionError::InvalidPath(e) => AppError::validation("path", e.to_string()),
        }
    }
}

/// Validate the command and queue the job; the job runs in the background.
#[tracing::instrument(skip(orchestrator))]
pub async fn handle(
    orchestrator: &IngestOrchestrator,
    command: StartIngestionCommand,
) -> Result<IngestionJob, StartIngestionError> {
    let kind = parse_entity_kind(&command.kind).map_err(StartIngestionError::InvalidKind)?;
    let job = orchestrator.submit(kind, &command.path).await?;
    Ok(job)
}
