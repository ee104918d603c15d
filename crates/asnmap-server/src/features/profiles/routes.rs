//! Profile API routes
//!
//! # Route Structure
//!
//! - `GET /api/v1/asn/:asn` - Composite profile with nested related ASNs
//! - `GET /api/v1/asn?country=FR` - Flat profiles for a country
//! - `GET /api/v1/asn?category=cdn` - Flat profiles for a category label

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use super::queries::{GetProfileQuery, ListProfilesQuery};
use crate::api::response::{ApiResponse, PaginationMeta};
use crate::error::AppError;
use crate::profile::ProfileAssembler;

pub fn profiles_routes() -> Router<ProfileAssembler> {
    Router::new()
        .route("/", get(list_profiles))
        .route("/:asn", get(get_profile))
}

/// Get one composite profile
///
/// # Query Parameters
///
/// - `sibling_depth`, `customer_depth`, `provider_depth` - expansion
///   overrides, each clamped to 0..=3
///
/// # Response
///
/// - `200 OK` - Profile found
/// - `400 Bad Request` - ASN is not numeric
/// - `404 Not Found` - ASN unknown (`NOT_FOUND`) or incomplete (`PARTIAL_DATA`)
#[tracing::instrument(skip(assembler, query), fields(asn = %asn))]
async fn get_profile(
    State(assembler): State<ProfileAssembler>,
    Path(asn): Path<String>,
    Query(mut query): Query<GetProfileQuery>,
) -> Result<Response, AppError> {
    query.asn = asn;
    let profile = super::queries::get::handle(&assembler, query).await?;

    tracing::debug!(
        asn = %profile.asn,
        siblings = profile.sibling_profiles.len(),
        providers = profile.provider_profiles.len(),
        "Profile assembled via API"
    );

    Ok((StatusCode::OK, Json(ApiResponse::success(profile))).into_response())
}

/// List profiles by country or category
///
/// # Query Parameters
///
/// - `country` - two-letter country code, or
/// - `category` - label matched against either category layer
/// - `page` - Page number (default: 1)
/// - `per_page` - Items per page (default: 20, max: 100)
#[tracing::instrument(
    skip(assembler, query),
    fields(country = ?query.country, category = ?query.category, page = ?query.page)
)]
async fn list_profiles(
    State(assembler): State<ProfileAssembler>,
    Query(query): Query<ListProfilesQuery>,
) -> Result<Response, AppError> {
    let listing = super::queries::list::handle(&assembler, query).await?;

    let meta = json!({
        "pagination": PaginationMeta::new(listing.page, listing.per_page, listing.total as u64)
    });

    Ok(
        (StatusCode::OK, Json(ApiResponse::success_with_meta(listing.entries, meta)))
            .into_response(),
    )
}
