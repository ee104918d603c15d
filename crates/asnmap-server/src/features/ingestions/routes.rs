//! Ingestion API routes
//!
//! # Route Structure
//!
//! - `POST /api/v1/ingestions` - Queue a background ingestion job
//! - `GET /api/v1/ingestions` - List jobs
//! - `GET /api/v1/ingestions/:job_id` - Job status and report

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use super::commands::StartIngestionCommand;
use crate::api::response::ApiResponse;
use crate::error::AppError;
use crate::ingest::IngestOrchestrator;

pub fn ingestions_routes() -> Router<IngestOrchestrator> {
    Router::new()
        .route("/", get(list_ingestions).post(start_ingestion))
        .route("/:job_id", get(get_ingestion))
}

/// Queue an ingestion job
///
/// # Request Body
///
/// ```json
/// { "kind": "relationship", "path": "20240101.as-rel.txt" }
/// ```
///
/// # Response
///
/// - `202 Accepted` - Job queued; poll `GET /ingestions/:job_id`
/// - `400 Bad Request` - Unknown kind or path outside the data directory
#[tracing::instrument(skip(orchestrator, command), fields(kind = %command.kind, path = %command.path))]
async fn start_ingestion(
    State(orchestrator): State<IngestOrchestrator>,
    Json(command): Json<StartIngestionCommand>,
) -> Result<Response, AppError> {
    let job = super::commands::start::handle(&orchestrator, command).await?;

    tracing::info!(job_id = %job.job_id, kind = %job.kind, "Ingestion queued via API");

    Ok((StatusCode::ACCEPTED, Json(ApiResponse::success(job))).into_response())
}

#[tracing::instrument(skip(orchestrator))]
async fn list_ingestions(State(orchestrator): State<IngestOrchestrator>) -> Response {
    let jobs = super::queries::list::handle(orchestrator.jobs()).await;
    let meta = json!({ "total": jobs.len() });
    (StatusCode::OK, Json(ApiResponse::success_with_meta(jobs, meta))).into_response()
}

#[tracing::instrument(skip(orchestrator))]
async fn get_ingestion(
    State(orchestrator): State<IngestOrchestrator>,
    Path(job_id): Path<String>,
) -> Result<Response, AppError> {
    let job = super::queries::get::handle(orchestrator.jobs(), &job_id).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(job))).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::{body_json, get, memory_state, post_json};
    use std::time::Duration;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_submit_then_poll_until_finished() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("as-rel.txt"), "1|2|0\nbroken\n").unwrap();
        let app = ingestions_routes().with_state(memory_state(dir.path()).orchestrator);

        let response = app
            .clone()
            .oneshot(post_json(
                "/",
                serde_json::json!({ "kind": "relationship", "path": "as-rel.txt" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = body_json(response).await;
        assert_eq!(body["data"]["status"], "queued");
        let job_id = body["data"]["job_id"].as_str().unwrap().to_string();

        let mut job = serde_json::Value::Null;
        for _ in 0..100 {
            let response = app.clone().oneshot(get(&format!("/{job_id}"))).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            job = body_json(response).await["data"].clone();
            if job["status"] == "completed" {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(job["status"], "completed");
        assert_eq!(job["report"]["records_processed"], 1);
        assert_eq!(job["report"]["records_skipped"], 1);

        let response = app.oneshot(get("/")).await.unwrap();
        assert_eq!(body_json(response).await["meta"]["total"], 1);
    }

    #[tokio::test]
    async fn test_bad_requests() {
        let dir = tempfile::tempdir().unwrap();
        let app = ingestions_routes().with_state(memory_state(dir.path()).orchestrator);

        let response = app
            .clone()
            .oneshot(post_json("/", serde_json::json!({ "kind": "nope", "path": "x" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(post_json("/", serde_json::json!({ "kind": "category", "path": "/etc/passwd" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app.clone().oneshot(get("/not-a-uuid")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(get(&format!("/{}", uuid::Uuid::new_v4())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
