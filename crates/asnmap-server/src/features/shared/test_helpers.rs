//! Test fixtures for feature routes
//!
//! Routers are built over a fresh [`MemoryRecordStore`]; records are seeded
//! straight into the store.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::Path;
use std::sync::Arc;

use asnmap_common::types::{CategoryLabel, DelegationRecord, OrganizationMapping, Record};
use axum::{
    body::Body,
    http::{Request, Response},
};
use http_body_util::BodyExt;

use crate::config::IngestConfig;
use crate::features::FeatureState;
use crate::ingest::IngestOrchestrator;
use crate::profile::{ExpansionDepth, ProfileAssembler};
use crate::store::{MemoryRecordStore, RecordStore};

pub fn memory_state(data_dir: &Path) -> FeatureState {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
    let ingest = IngestConfig {
        data_dir: data_dir.to_path_buf(),
        max_reported_errors: 10,
        max_retained_jobs: 10,
    };
    FeatureState {
        profiles: ProfileAssembler::new(store.clone(), ExpansionDepth::default()),
        orchestrator: IngestOrchestrator::new(store.clone(), &ingest),
        store,
    }
}

/// Store the three required records for `asn`.
pub async fn seed_profile(store: &dyn RecordStore, asn: &str, cc: &str, category: &str) {
    let records = [
        Record::Organization(OrganizationMapping {
            asn: asn.to_string(),
            name: format!("Net {asn}"),
            ..Default::default()
        }),
        Record::Delegation(DelegationRecord {
            value: asn.to_string(),
            cc: cc.to_string(),
            ..Default::default()
        }),
        Record::Category(CategoryLabel {
            asn: asn.to_string(),
            category_1: category.to_string(),
            category_2: String::new(),
        }),
    ];
    for record in records {
        store.upsert(record).await.expect("seed record");
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}
