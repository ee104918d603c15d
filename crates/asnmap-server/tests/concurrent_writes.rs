//! Concurrent writers on one SQLite database file
//!
//! Two stores with separate pools stand in for two server processes sharing a
//! database. Their writes to the same keys must all land without a conflict.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::path::Path;
use std::sync::Arc;

use asnmap_common::types::{EntityKind, RelationshipEdge, RelationshipUpdate};
use asnmap_server::config::{StoreBackend, StoreConfig};
use asnmap_server::db::{create_pool, run_migrations};
use asnmap_server::ingest::ReportStatus;
use asnmap_server::store::{RecordStore, RetryConfig, SqliteRecordStore};
use common::*;

const KEYS: u32 = 20;

async fn file_store(path: &Path) -> Arc<SqliteRecordStore> {
    let config = StoreConfig {
        backend: StoreBackend::Sqlite,
        url: format!("sqlite://{}?mode=rwc", path.display()),
        max_connections: 4,
        connect_timeout_secs: 10,
        write_retries: 10,
    };
    let pool = create_pool(&config).await.unwrap();
    run_migrations(&pool).await.unwrap();
    Arc::new(SqliteRecordStore::new(pool, RetryConfig::for_writes(config.write_retries)))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_pools_merge_both_directions_without_loss() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("asnmap.db");
    let first = file_store(&db).await;
    let second = file_store(&db).await;

    let mut handles = Vec::new();
    for i in 0..KEYS {
        let asn = (64500 + i).to_string();
        // each direction goes through the other pool on alternating keys
        let (customer_store, provider_store) = if i % 2 == 0 {
            (first.clone(), second.clone())
        } else {
            (second.clone(), first.clone())
        };

        let update = RelationshipUpdate::customer(asn.clone(), format!("{}", 65000 + i));
        handles.push(tokio::spawn(async move { customer_store.merge_relationship(&update).await }));
        let update = RelationshipUpdate::provider(asn, format!("{}", 66000 + i));
        handles.push(tokio::spawn(async move { provider_store.merge_relationship(&update).await }));
    }

    for handle in handles {
        let result = handle.await.unwrap();
        assert!(result.is_ok(), "merge failed: {result:?}");
    }

    for i in 0..KEYS {
        let asn = (64500 + i).to_string();
        let edge = first.relationship(&asn).await.unwrap().unwrap();
        assert_eq!(
            edge,
            RelationshipEdge::new(asn.as_str(), (65000 + i).to_string(), (66000 + i).to_string())
        );
    }
    assert_eq!(second.count(EntityKind::Relationship).await.unwrap(), i64::from(KEYS));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reingestion_matches_single_run() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(dir.path(), "as-rel.txt", RELATIONSHIP_FILE);
    let keys = ["64500", "64501", "64502"];

    let reference = dir.path().join("reference.db");
    let single = file_store(&reference).await;
    let report = run(single.as_ref(), EntityKind::Relationship, &file).await;
    assert_eq!(report.status, ReportStatus::Completed);
    let expected = snapshot(single.as_ref(), EntityKind::Relationship, &keys).await;

    let shared = dir.path().join("shared.db");
    let first = file_store(&shared).await;
    let second = file_store(&shared).await;
    let (a, b) = tokio::join!(
        run(first.as_ref(), EntityKind::Relationship, &file),
        run(second.as_ref(), EntityKind::Relationship, &file),
    );

    for report in [a, b] {
        assert_eq!(report.status, ReportStatus::Completed, "{:?}", report.errors);
        assert_eq!(report.records_skipped, 0);
    }
    assert_eq!(snapshot(first.as_ref(), EntityKind::Relationship, &keys).await, expected);
}
