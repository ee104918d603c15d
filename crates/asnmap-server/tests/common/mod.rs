//! Shared fixtures for asnmap server integration tests
//!
//! Every property test runs against both store backends: the in-memory map
//! store and an in-memory SQLite database with migrations applied.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use asnmap_common::types::{EntityKind, Record};
use asnmap_server::ingest::{ingest, IngestOptions, IngestionReport};
use asnmap_server::store::{MemoryRecordStore, RecordStore, SqliteRecordStore};

pub const DELEGATION_FILE: &str = "\
2|ripencc|20240101|3|19830705|20240101|+0100
noise before the sentinel
iana|ZZ|asn|0|1|20140311|reserved|ietf|iana
ripencc|FR|asn|1|64500|20200101|allocated|opaque-1|e-stats
ripencc|FR|asn|1|64501|20200101|allocated|opaque-2|e-stats
ripencc|DE|asn|1|64502|20200101|allocated|opaque-3|e-stats
";

pub const CATEGORY_FILE: &str = "\
ASN,Category 1 - Layer 1,Category 1 - Layer 2
AS64500,isp,transit
AS64501,cdn,content
AS64502,isp,
";

pub const ORGANIZATION_FILE: &str = r#"{
  "AS64500": { "Name": "Alpha", "Website": "https://alpha.example", "Sibling ASNs": ["AS64501"] },
  "64501": { "Name": "Beta", "Sibling ASNs": ["64500"] },
  "64502": { "Name": "Gamma" }
}"#;

pub const RELATIONSHIP_FILE: &str = "\
# source:topology|BGP
# input clique: 64502
64502|64500|-1
64500|64501|0
64501|64502|-1
";

/// Both backends, labelled for assertion messages.
pub async fn stores() -> Vec<(&'static str, Arc<dyn RecordStore>)> {
    let sqlite = SqliteRecordStore::in_memory()
        .await
        .expect("in-memory sqlite store");
    vec![
        ("memory", Arc::new(MemoryRecordStore::new()) as Arc<dyn RecordStore>),
        ("sqlite", Arc::new(sqlite) as Arc<dyn RecordStore>),
    ]
}

pub fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write fixture");
    path
}

pub async fn run(store: &dyn RecordStore, kind: EntityKind, path: &Path) -> IngestionReport {
    ingest(store, kind, path, &IngestOptions::default()).await
}

/// Write every dataset fixture to `dir` and ingest it into `store`.
pub async fn load_all(store: &dyn RecordStore, dir: &Path) {
    for (kind, name, contents) in [
        (EntityKind::Organization, "as2org.json", ORGANIZATION_FILE),
        (EntityKind::Delegation, "delegated.txt", DELEGATION_FILE),
        (EntityKind::Category, "categories.csv", CATEGORY_FILE),
        (EntityKind::Relationship, "as-rel.txt", RELATIONSHIP_FILE),
    ] {
        let path = write_fixture(dir, name, contents);
        let report = run(store, kind, &path).await;
        assert!(!report.is_failed(), "{kind} ingestion failed: {:?}", report.failure);
    }
}

/// Stored records for `keys` plus the total count, for before/after comparison.
pub async fn snapshot(
    store: &dyn RecordStore,
    kind: EntityKind,
    keys: &[&str],
) -> (i64, Vec<Option<Record>>) {
    let mut records = Vec::with_capacity(keys.len());
    for key in keys {
        records.push(store.get(kind, key).await.expect("get record"));
    }
    (store.count(kind).await.expect("count"), records)
}
