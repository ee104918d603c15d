//! `GET /api/v1/org-info/:org_id`

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use crate::api::response::ApiResponse;
use crate::error::AppError;
use crate::store::RecordStore;

pub fn org_info_routes() -> Router<Arc<dyn RecordStore>> {
    Router::new().route("/:org_id", get(get_org_info))
}

#[tracing::instrument(skip(store))]
async fn get_org_info(
    State(store): State<Arc<dyn RecordStore>>,
    Path(org_id): Path<String>,
) -> Result<Response, AppError> {
    let info = super::queries::handle(store.as_ref(), &org_id).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(info))).into_response())
}
