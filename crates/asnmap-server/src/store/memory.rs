//! In-memory record store
//!
//! One map per entity kind behind a single `RwLock`. Every write holds the
//! write guard for its whole read-modify-write, which gives the same per-key
//! atomicity as the SQLite backend.

use std::collections::BTreeMap;

use asnmap_common::types::{
    CategoryLabel, DelegationRecord, EntityKind, OrganizationInfo, OrganizationMapping, Record,
    RelationshipEdge, RelationshipUpdate,
};
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{RecordStore, StoreResult, UpsertOutcome};

#[derive(Default)]
struct Tables {
    organizations: BTreeMap<String, OrganizationMapping>,
    delegations: BTreeMap<String, DelegationRecord>,
    categories: BTreeMap<String, CategoryLabel>,
    relationships: BTreeMap<String, RelationshipEdge>,
    org_info: BTreeMap<String, OrganizationInfo>,
}

fn replace<V>(table: &mut BTreeMap<String, V>, key: &str, value: V) -> UpsertOutcome {
    match table.insert(key.to_string(), value) {
        Some(_) => UpsertOutcome::Updated,
        None => UpsertOutcome::Inserted,
    }
}

#[derive(Default)]
pub struct MemoryRecordStore {
    tables: RwLock<Tables>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, kind: EntityKind, key: &str) -> StoreResult<Option<Record>> {
        let tables = self.tables.read().await;
        let record = match kind {
            EntityKind::Organization => tables.organizations.get(key).cloned().map(Record::Organization),
            EntityKind::Delegation => tables.delegations.get(key).cloned().map(Record::Delegation),
            EntityKind::Category => tables.categories.get(key).cloned().map(Record::Category),
            EntityKind::Relationship => {
                tables.relationships.get(key).cloned().map(Record::Relationship)
            },
            EntityKind::OrgInfo => tables.org_info.get(key).cloned().map(Record::OrgInfo),
        };
        Ok(record)
    }

    async fn upsert(&self, record: Record) -> StoreResult<UpsertOutcome> {
        let mut tables = self.tables.write().await;
        let key = record.key().to_string();
        let outcome = match record {
            Record::Organization(r) => replace(&mut tables.organizations, &key, r),
            Record::Delegation(r) => replace(&mut tables.delegations, &key, r),
            Record::Category(r) => replace(&mut tables.categories, &key, r),
            Record::Relationship(r) => replace(&mut tables.relationships, &key, r),
            Record::OrgInfo(r) => replace(&mut tables.org_info, &key, r),
        };
        Ok(outcome)
    }

    async fn merge_relationship(
        &self,
        update: &RelationshipUpdate,
    ) -> StoreResult<RelationshipEdge> {
        let mut tables = self.tables.write().await;
        let existing = tables.relationships.remove(update.asn());
        let merged = update.apply_to(existing);
        tables.relationships.insert(merged.asn.clone(), merged.clone());
        Ok(merged)
    }

    async fn find_delegations_by_country(&self, cc: &str) -> StoreResult<Vec<DelegationRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .delegations
            .values()
            .filter(|d| d.cc == cc)
            .cloned()
            .collect())
    }

    async fn find_categories(&self, label: &str) -> StoreResult<Vec<CategoryLabel>> {
        let tables = self.tables.read().await;
        Ok(tables
            .categories
            .values()
            .filter(|c| c.has_label(label))
            .cloned()
            .collect())
    }

    async fn count(&self, kind: EntityKind) -> StoreResult<i64> {
        let tables = self.tables.read().await;
        let n = match kind {
            EntityKind::Organization => tables.organizations.len(),
            EntityKind::Delegation => tables.delegations.len(),
            EntityKind::Category => tables.categories.len(),
            EntityKind::Relationship => tables.relationships.len(),
            EntityKind::OrgInfo => tables.org_info.len(),
        };
        Ok(n as i64)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn category(asn: &str, c1: &str, c2: &str) -> Record {
        Record::Category(CategoryLabel {
            asn: asn.to_string(),
            category_1: c1.to_string(),
            category_2: c2.to_string(),
        })
    }

    #[tokio::test]
    async fn test_upsert_replaces_all_fields() {
        let store = MemoryRecordStore::new();
        assert_eq!(store.upsert(category("1", "cdn", "content")).await.unwrap(), UpsertOutcome::Inserted);
        assert_eq!(store.upsert(category("1", "isp", "")).await.unwrap(), UpsertOutcome::Updated);

        let stored = store.category("1").await.unwrap().unwrap();
        assert_eq!(stored.category_1, "isp");
        assert_eq!(stored.category_2, "");
        assert_eq!(store.count(EntityKind::Category).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_categories_matches_either_layer() {
        let store = MemoryRecordStore::new();
        store.upsert(category("1", "cdn", "content")).await.unwrap();
        store.upsert(category("2", "isp", "cdn")).await.unwrap();
        store.upsert(category("3", "isp", "transit")).await.unwrap();

        let found = store.find_categories("cdn").await.unwrap();
        let asns: Vec<_> = found.iter().map(|c| c.asn.as_str()).collect();
        assert_eq!(asns, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_concurrent_merges_keep_both_directions() {
        let store = Arc::new(MemoryRecordStore::new());
        let mut handles = Vec::new();
        for update in [
            RelationshipUpdate::customer("64500", "64501"),
            RelationshipUpdate::provider("64500", "64502"),
        ] {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.merge_relationship(&update).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let edge = store.relationship("64500").await.unwrap().unwrap();
        assert_eq!(edge, RelationshipEdge::new("64500", "64501", "64502"));
    }

    #[tokio::test]
    async fn test_get_wrong_kind_is_none() {
        let store = MemoryRecordStore::new();
        store.upsert(category("1", "cdn", "")).await.unwrap();
        assert!(store.organization("1").await.unwrap().is_none());
    }
}
