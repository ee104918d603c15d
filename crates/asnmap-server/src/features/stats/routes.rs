//! `GET /api/v1/stats`

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use crate::api::response::ApiResponse;
use crate::error::AppError;
use crate::store::RecordStore;

pub fn stats_routes() -> Router<Arc<dyn RecordStore>> {
    Router::new().route("/", get(get_stats))
}

#[tracing::instrument(skip(store))]
async fn get_stats(State(store): State<Arc<dyn RecordStore>>) -> Result<Response, AppError> {
    let stats = super::queries::handle(store.as_ref()).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(stats))).into_response())
}
