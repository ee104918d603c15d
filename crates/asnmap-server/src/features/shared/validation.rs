//! Shared validation utilities
//!
//! Turns raw request strings into domain values, reporting failures as
//! [`AppError::Validation`] so handlers answer 400 before touching the store.

use asnmap_common::types::EntityKind;
use uuid::Uuid;

use crate::error::AppError;

/// Parse an entity kind name such as `relationship` or `org-info`.
pub fn parse_entity_kind(raw: &str) -> Result<EntityKind, AppError> {
    raw.parse::<EntityKind>().map_err(|_| {
        let expected = EntityKind::ALL
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        AppError::validation("kind", format!("'{raw}' is not one of: {expected}"))
    })
}

pub fn parse_job_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::validation("job_id", format!("'{raw}' is not a valid UUID")))
}
