//! Record store
//!
//! [`RecordStore`] is the storage seam between ingestion, lookups and the
//! persistence engine. Every entity kind lives in its own table keyed by its
//! natural identifier. Writes are atomic per key:
//!
//! - `upsert` replaces every field of the stored record, or inserts it
//! - `merge_relationship` reads the stored edge, applies one directional
//!   update and writes the result back without losing the other direction
//!
//! Two backends exist: [`SqliteRecordStore`] for deployments and
//! [`MemoryRecordStore`] for tests and throwaway runs. Handles are shared as
//! `Arc<dyn RecordStore>` and passed explicitly to whoever needs them.

use std::sync::Arc;

use asnmap_common::types::{
    CategoryLabel, DelegationRecord, EntityKind, OrganizationInfo, OrganizationMapping, Record,
    RelationshipEdge, RelationshipUpdate,
};
use asnmap_common::AsnMapError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{StoreBackend, StoreConfig};

pub mod locks;
pub mod memory;
pub mod retry;
pub mod sqlite;

pub use memory::MemoryRecordStore;
pub use retry::RetryConfig;
pub use sqlite::SqliteRecordStore;

/// Store operation errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A write kept colliding with concurrent writers until the retry bound
    #[error("Write conflict on {kind} '{key}' after {attempts} attempts")]
    Conflict {
        kind: EntityKind,
        key: String,
        attempts: u32,
    },

    #[error("Stored value could not be decoded: {0}")]
    Codec(#[from] AsnMapError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Whether an upsert created a row or replaced one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Backend name for health and stats output
    fn backend(&self) -> &'static str;

    /// Point lookup by natural key
    async fn get(&self, kind: EntityKind, key: &str) -> StoreResult<Option<Record>>;

    /// Insert the record or overwrite every field of the stored one
    async fn upsert(&self, record: Record) -> StoreResult<UpsertOutcome>;

    /// Apply one relationship observation to the stored edge and return the
    /// merged edge. Read and write happen atomically for the edge's ASN.
    async fn merge_relationship(&self, update: &RelationshipUpdate)
        -> StoreResult<RelationshipEdge>;

    /// Delegation records whose country code equals `cc` exactly
    async fn find_delegations_by_country(&self, cc: &str) -> StoreResult<Vec<DelegationRecord>>;

    /// Category labels with `label` in either layer
    async fn find_categories(&self, label: &str) -> StoreResult<Vec<CategoryLabel>>;

    async fn count(&self, kind: EntityKind) -> StoreResult<i64>;

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn organization(&self, asn: &str) -> StoreResult<Option<OrganizationMapping>> {
        Ok(match self.get(EntityKind::Organization, asn).await? {
            Some(Record::Organization(record)) => Some(record),
            _ => None,
        })
    }

    async fn delegation(&self, value: &str) -> StoreResult<Option<DelegationRecord>> {
        Ok(match self.get(EntityKind::Delegation, value).await? {
            Some(Record::Delegation(record)) => Some(record),
            _ => None,
        })
    }

    async fn category(&self, asn: &str) -> StoreResult<Option<CategoryLabel>> {
        Ok(match self.get(EntityKind::Category, asn).await? {
            Some(Record::Category(record)) => Some(record),
            _ => None,
        })
    }

    async fn relationship(&self, asn: &str) -> StoreResult<Option<RelationshipEdge>> {
        Ok(match self.get(EntityKind::Relationship, asn).await? {
            Some(Record::Relationship(record)) => Some(record),
            _ => None,
        })
    }

    async fn org_info(&self, org_id: &str) -> StoreResult<Option<OrganizationInfo>> {
        Ok(match self.get(EntityKind::OrgInfo, org_id).await? {
            Some(Record::OrgInfo(record)) => Some(record),
            _ => None,
        })
    }
}

/// Open the store selected by configuration.
///
/// SQLite stores are migrated before they are returned.
pub async fn connect(config: &StoreConfig) -> StoreResult<Arc<dyn RecordStore>> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory record store");
            Ok(Arc::new(MemoryRecordStore::new()))
        },
        StoreBackend::Sqlite => {
            let pool = crate::db::create_pool(config).await?;
            crate::db::run_migrations(&pool).await?;
            let retry = RetryConfig::for_writes(config.write_retries);
            Ok(Arc::new(SqliteRecordStore::new(pool, retry)))
        },
    }
}
