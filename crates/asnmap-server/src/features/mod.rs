//! Feature modules implementing the asnmap API
//!
//! Each feature is a vertical slice with its own queries (reads), commands
//! (writes, where there are any) and routes.
//!
//! # Features
//!
//! - **profiles**: composite ASN profiles and country/category listings
//! - **ingestions**: background ingestion jobs and their reports
//! - **org_info**: as-org2info organization records
//! - **stats**: record counts per entity kind

pub mod ingestions;
pub mod org_info;
pub mod profiles;
pub mod shared;
pub mod stats;

use std::sync::Arc;

use axum::Router;

use crate::config::Config;
use crate::ingest::IngestOrchestrator;
use crate::profile::ProfileAssembler;
use crate::store::RecordStore;

/// Shared state for all feature routes
///
/// Every component holds the same store handle.
#[derive(Clone)]
pub struct FeatureState {
    pub store: Arc<dyn RecordStore>,
    pub profiles: ProfileAssembler,
    pub orchestrator: IngestOrchestrator,
}

impl FeatureState {
    pub fn new(store: Arc<dyn RecordStore>, config: &Config) -> Self {
        Self {
            profiles: ProfileAssembler::new(store.clone(), config.profile.expansion_depth()),
            orchestrator: IngestOrchestrator::new(store.clone(), &config.ingest),
            store,
        }
    }
}

/// Creates the API router with all feature routes mounted
///
/// - `/asn` - Profile lookups
/// - `/ingestions` - Ingestion jobs
/// - `/org-info` - Organization records
/// - `/stats` - Record counts
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .nest("/asn", profiles::profiles_routes().with_state(state.profiles.clone()))
        .nest(
            "/ingestions",
            ingestions::ingestions_routes().with_state(state.orchestrator.clone()),
        )
        .nest("/org-info", org_info::org_info_routes().with_state(state.store.clone()))
        .nest("/stats", stats::stats_routes().with_state(state.store.clone()))
}
