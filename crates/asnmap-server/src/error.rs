//! Server-specific error types

use asnmap_common::types::EntityKind;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::api::response::ErrorResponse;
use crate::profile::ProfileError;
use crate::store::StoreError;

/// Errors surfaced by HTTP handlers
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("{0}")]
    NotFound(String),

    #[error("ASN {asn} is incomplete")]
    PartialData {
        asn: String,
        missing_sources: Vec<EntityKind>,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<ProfileError> for AppError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::Validation { field, message } => AppError::validation(field, message),
            ProfileError::NotFound { asn } => AppError::NotFound(format!("ASN {asn} not found")),
            ProfileError::PartialData {
                asn,
                missing_sources,
            } => AppError::PartialData {
                asn,
                missing_sources,
            },
            ProfileError::Store(e) => AppError::Store(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::with_details(
                    "VALIDATION_ERROR",
                    format!("Invalid {field}: {message}"),
                    json!({ "field": field }),
                ),
            ),
            AppError::NotFound(message) => {
                (StatusCode::NOT_FOUND, ErrorResponse::new("NOT_FOUND", message))
            },
            AppError::PartialData {
                asn,
                missing_sources,
            } => (
                StatusCode::NOT_FOUND,
                ErrorResponse::with_details(
                    "PARTIAL_DATA",
                    format!("ASN {asn} is missing from some sources"),
                    json!({ "asn": asn, "missing_sources": missing_sources }),
                ),
            ),
            AppError::Store(StoreError::Conflict { kind, key, attempts }) => {
                tracing::warn!(kind = %kind, key = %key, attempts, "Store conflict surfaced to client");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse::new("WRITE_CONFLICT", "The store is busy, retry later"),
                )
            },
            AppError::Store(e) => {
                tracing::error!("Store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("INTERNAL_ERROR", "A storage error occurred"),
                )
            },
        };

        (status, Json(error)).into_response()
    }
}
