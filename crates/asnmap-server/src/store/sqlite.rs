//! SQLite-backed record store
//!
//! Each write runs in its own transaction under a per-key lock. The lock
//! serializes writers inside this process; the transaction plus bounded retry
//! covers other processes sharing the same database file.

use asnmap_common::list_codec::{decode_list, encode_list};
use asnmap_common::types::{
    CategoryLabel, DelegationRecord, EntityKind, OrganizationInfo, OrganizationMapping, Record,
    RelationshipEdge, RelationshipUpdate,
};
use asnmap_common::AsnMapError;
use async_trait::async_trait;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;

use super::locks::KeyLocks;
use super::retry::{with_retry, RetryConfig};
use super::{RecordStore, StoreResult, UpsertOutcome};

// ============================================================================
// SQL
// ============================================================================

const ORGANIZATION_COLUMNS: &str = "asn, status, reference_orgs, sibling_asns, name, descr, \
     website, comparison_ca2o, comparison_pdb, pdb_org_id, pdb_org";

const UPSERT_ORGANIZATION: &str = r#"
    INSERT INTO organization_mappings
        (asn, status, reference_orgs, sibling_asns, name, descr, website,
         comparison_ca2o, comparison_pdb, pdb_org_id, pdb_org)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(asn) DO UPDATE SET
        status = excluded.status,
        reference_orgs = excluded.reference_orgs,
        sibling_asns = excluded.sibling_asns,
        name = excluded.name,
        descr = excluded.descr,
        website = excluded.website,
        comparison_ca2o = excluded.comparison_ca2o,
        comparison_pdb = excluded.comparison_pdb,
        pdb_org_id = excluded.pdb_org_id,
        pdb_org = excluded.pdb_org
"#;

const DELEGATION_COLUMNS: &str =
    "value, registry, cc, allocation_type, start, date, status, opaque_id, extensions";

const UPSERT_DELEGATION: &str = r#"
    INSERT INTO delegation_records
        (value, registry, cc, allocation_type, start, date, status, opaque_id, extensions)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(value) DO UPDATE SET
        registry = excluded.registry,
        cc = excluded.cc,
        allocation_type = excluded.allocation_type,
        start = excluded.start,
        date = excluded.date,
        status = excluded.status,
        opaque_id = excluded.opaque_id,
        extensions = excluded.extensions
"#;

const UPSERT_CATEGORY: &str = r#"
    INSERT INTO category_labels (asn, category_1, category_2)
    VALUES (?, ?, ?)
    ON CONFLICT(asn) DO UPDATE SET
        category_1 = excluded.category_1,
        category_2 = excluded.category_2
"#;

const UPSERT_RELATIONSHIP: &str = r#"
    INSERT INTO relationship_edges (asn, customer, provider)
    VALUES (?, ?, ?)
    ON CONFLICT(asn) DO UPDATE SET
        customer = excluded.customer,
        provider = excluded.provider
"#;

const UPSERT_ORG_INFO: &str = r#"
    INSERT INTO organization_info (org_id, changed, org_name, country, source)
    VALUES (?, ?, ?, ?, ?)
    ON CONFLICT(org_id) DO UPDATE SET
        changed = excluded.changed,
        org_name = excluded.org_name,
        country = excluded.country,
        source = excluded.source
"#;

fn table_for(kind: EntityKind) -> (&'static str, &'static str) {
    match kind {
        EntityKind::Organization => ("organization_mappings", "asn"),
        EntityKind::Delegation => ("delegation_records", "value"),
        EntityKind::Category => ("category_labels", "asn"),
        EntityKind::Relationship => ("relationship_edges", "asn"),
        EntityKind::OrgInfo => ("organization_info", "org_id"),
    }
}

// ============================================================================
// Rows
// ============================================================================

#[derive(Debug, FromRow)]
struct OrganizationRow {
    asn: String,
    status: String,
    reference_orgs: String,
    sibling_asns: String,
    name: String,
    descr: String,
    website: String,
    comparison_ca2o: String,
    comparison_pdb: String,
    pdb_org_id: String,
    pdb_org: String,
}

impl TryFrom<OrganizationRow> for OrganizationMapping {
    type Error = AsnMapError;

    fn try_from(row: OrganizationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            reference_orgs: decode_list("reference_orgs", &row.reference_orgs)?,
            sibling_asns: decode_list("sibling_asns", &row.sibling_asns)?,
            asn: row.asn,
            status: row.status,
            name: row.name,
            descr: row.descr,
            website: row.website,
            comparison_ca2o: row.comparison_ca2o,
            comparison_pdb: row.comparison_pdb,
            pdb_org_id: row.pdb_org_id,
            pdb_org: row.pdb_org,
        })
    }
}

#[derive(Debug, FromRow)]
struct DelegationRow {
    value: String,
    registry: String,
    cc: String,
    allocation_type: String,
    start: String,
    date: String,
    status: String,
    opaque_id: String,
    extensions: String,
}

impl From<DelegationRow> for DelegationRecord {
    fn from(row: DelegationRow) -> Self {
        Self {
            value: row.value,
            registry: row.registry,
            cc: row.cc,
            allocation_type: row.allocation_type,
            start: row.start,
            date: row.date,
            status: row.status,
            opaque_id: row.opaque_id,
            extensions: row.extensions,
        }
    }
}

#[derive(Debug, FromRow)]
struct CategoryRow {
    asn: String,
    category_1: String,
    category_2: String,
}

impl From<CategoryRow> for CategoryLabel {
    fn from(row: CategoryRow) -> Self {
        Self {
            asn: row.asn,
            category_1: row.category_1,
            category_2: row.category_2,
        }
    }
}

#[derive(Debug, FromRow)]
struct RelationshipRow {
    asn: String,
    customer: String,
    provider: String,
}

impl From<RelationshipRow> for RelationshipEdge {
    fn from(row: RelationshipRow) -> Self {
        RelationshipEdge::new(row.asn, row.customer, row.provider)
    }
}

#[derive(Debug, FromRow)]
struct OrgInfoRow {
    org_id: String,
    changed: String,
    org_name: String,
    country: String,
    source: String,
}

impl From<OrgInfoRow> for OrganizationInfo {
    fn from(row: OrgInfoRow) -> Self {
        Self {
            org_id: row.org_id,
            changed: row.changed,
            org_name: row.org_name,
            country: row.country,
            source: row.source,
        }
    }
}

// ============================================================================
// Connection-level helpers
// ============================================================================

async fn fetch_record(
    conn: &mut SqliteConnection,
    kind: EntityKind,
    key: &str,
) -> StoreResult<Option<Record>> {
    let (table, key_column) = table_for(kind);
    let record = match kind {
        EntityKind::Organization => {
            let sql = format!("SELECT {ORGANIZATION_COLUMNS} FROM {table} WHERE {key_column} = ?");
            let row = sqlx::query_as::<_, OrganizationRow>(&sql)
                .bind(key)
                .fetch_optional(&mut *conn)
                .await?;
            row.map(OrganizationMapping::try_from)
                .transpose()?
                .map(Record::Organization)
        },
        EntityKind::Delegation => {
            let sql = format!("SELECT {DELEGATION_COLUMNS} FROM {table} WHERE {key_column} = ?");
            sqlx::query_as::<_, DelegationRow>(&sql)
                .bind(key)
                .fetch_optional(&mut *conn)
                .await?
                .map(|row| Record::Delegation(row.into()))
        },
        EntityKind::Category => sqlx::query_as::<_, CategoryRow>(
            "SELECT asn, category_1, category_2 FROM category_labels WHERE asn = ?",
        )
        .bind(key)
        .fetch_optional(&mut *conn)
        .await?
        .map(|row| Record::Category(row.into())),
        EntityKind::Relationship => fetch_edge(conn, key).await?.map(Record::Relationship),
        EntityKind::OrgInfo => sqlx::query_as::<_, OrgInfoRow>(
            "SELECT org_id, changed, org_name, country, source FROM organization_info WHERE org_id = ?",
        )
        .bind(key)
        .fetch_optional(&mut *conn)
        .await?
        .map(|row| Record::OrgInfo(row.into())),
    };
    Ok(record)
}

async fn fetch_edge(conn: &mut SqliteConnection, asn: &str) -> StoreResult<Option<RelationshipEdge>> {
    Ok(sqlx::query_as::<_, RelationshipRow>(
        "SELECT asn, customer, provider FROM relationship_edges WHERE asn = ?",
    )
    .bind(asn)
    .fetch_optional(&mut *conn)
    .await?
    .map(RelationshipEdge::from))
}

async fn exists(conn: &mut SqliteConnection, kind: EntityKind, key: &str) -> StoreResult<bool> {
    let (table, key_column) = table_for(kind);
    let sql = format!("SELECT 1 FROM {table} WHERE {key_column} = ?");
    let found = sqlx::query_scalar::<_, i64>(&sql)
        .bind(key)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(found.is_some())
}

async fn write_record(conn: &mut SqliteConnection, record: &Record) -> StoreResult<()> {
    match record {
        Record::Organization(r) => {
            sqlx::query(UPSERT_ORGANIZATION)
                .bind(&r.asn)
                .bind(&r.status)
                .bind(encode_list(&r.reference_orgs)?)
                .bind(encode_list(&r.sibling_asns)?)
                .bind(&r.name)
                .bind(&r.descr)
                .bind(&r.website)
                .bind(&r.comparison_ca2o)
                .bind(&r.comparison_pdb)
                .bind(&r.pdb_org_id)
                .bind(&r.pdb_org)
                .execute(&mut *conn)
                .await?;
        },
        Record::Delegation(r) => {
            sqlx::query(UPSERT_DELEGATION)
                .bind(&r.value)
                .bind(&r.registry)
                .bind(&r.cc)
                .bind(&r.allocation_type)
                .bind(&r.start)
                .bind(&r.date)
                .bind(&r.status)
                .bind(&r.opaque_id)
                .bind(&r.extensions)
                .execute(&mut *conn)
                .await?;
        },
        Record::Category(r) => {
            sqlx::query(UPSERT_CATEGORY)
                .bind(&r.asn)
                .bind(&r.category_1)
                .bind(&r.category_2)
                .execute(&mut *conn)
                .await?;
        },
        Record::Relationship(r) => {
            sqlx::query(UPSERT_RELATIONSHIP)
                .bind(&r.asn)
                .bind(&r.customer)
                .bind(&r.provider)
                .execute(&mut *conn)
                .await?;
        },
        Record::OrgInfo(r) => {
            sqlx::query(UPSERT_ORG_INFO)
                .bind(&r.org_id)
                .bind(&r.changed)
                .bind(&r.org_name)
                .bind(&r.country)
                .bind(&r.source)
                .execute(&mut *conn)
                .await?;
        },
    }
    Ok(())
}

// ============================================================================
// Store
// ============================================================================

pub struct SqliteRecordStore {
    pool: SqlitePool,
    locks: KeyLocks,
    retry: RetryConfig,
}

impl SqliteRecordStore {
    pub fn new(pool: SqlitePool, retry: RetryConfig) -> Self {
        Self {
            pool,
            locks: KeyLocks::new(),
            retry,
        }
    }

    /// Private migrated database that lives as long as the store
    pub async fn in_memory() -> StoreResult<Self> {
        let pool = crate::db::memory_pool().await?;
        crate::db::run_migrations(&pool).await?;
        Ok(Self::new(pool, RetryConfig::default()))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn upsert_once(&self, record: &Record) -> StoreResult<UpsertOutcome> {
        let mut tx = self.pool.begin().await?;
        let existed = exists(&mut tx, record.kind(), record.key()).await?;
        write_record(&mut tx, record).await?;
        tx.commit().await?;

        Ok(if existed {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        })
    }

    async fn merge_once(&self, update: &RelationshipUpdate) -> StoreResult<RelationshipEdge> {
        let mut tx = self.pool.begin().await?;
        let existing = fetch_edge(&mut tx, update.asn()).await?;
        let merged = update.apply_to(existing);
        write_record(&mut tx, &Record::Relationship(merged.clone())).await?;
        tx.commit().await?;
        Ok(merged)
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn get(&self, kind: EntityKind, key: &str) -> StoreResult<Option<Record>> {
        let mut conn = self.pool.acquire().await?;
        fetch_record(&mut conn, kind, key).await
    }

    async fn upsert(&self, record: Record) -> StoreResult<UpsertOutcome> {
        let kind = record.kind();
        let _guard = self.locks.lock(kind, record.key()).await;
        let outcome =
            with_retry(&self.retry, kind, record.key(), || self.upsert_once(&record)).await?;
        debug!(%kind, key = record.key(), ?outcome, "Record upserted");
        Ok(outcome)
    }

    async fn merge_relationship(
        &self,
        update: &RelationshipUpdate,
    ) -> StoreResult<RelationshipEdge> {
        let _guard = self.locks.lock(EntityKind::Relationship, update.asn()).await;
        with_retry(&self.retry, EntityKind::Relationship, update.asn(), || {
            self.merge_once(update)
        })
        .await
    }

    async fn find_delegations_by_country(&self, cc: &str) -> StoreResult<Vec<DelegationRecord>> {
        let sql = format!("SELECT {DELEGATION_COLUMNS} FROM delegation_records WHERE cc = ? ORDER BY value");
        let rows = sqlx::query_as::<_, DelegationRow>(&sql)
            .bind(cc)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(DelegationRecord::from).collect())
    }

    async fn find_categories(&self, label: &str) -> StoreResult<Vec<CategoryLabel>> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT asn, category_1, category_2
            FROM category_labels
            WHERE category_1 = ? OR category_2 = ?
            ORDER BY asn
            "#,
        )
        .bind(label)
        .bind(label)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(CategoryLabel::from).collect())
    }

    async fn count(&self, kind: EntityKind) -> StoreResult<i64> {
        let (table, _) = table_for(kind);
        let sql = format!("SELECT COUNT(*) FROM {table}");
        Ok(sqlx::query_scalar::<_, i64>(&sql).fetch_one(&self.pool).await?)
    }

    async fn health_check(&self) -> StoreResult<()> {
        crate::db::health_check(&self.pool).await?;
        Ok(())
    }
}
