use std::collections::BTreeMap;

use asnmap_common::types::EntityKind;
use serde::{Deserialize, Serialize};

use crate::store::{RecordStore, StoreResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub backend: String,
    pub counts: BTreeMap<EntityKind, i64>,
    pub total: i64,
}

#[tracing::instrument(skip(store))]
pub async fn handle(store: &dyn RecordStore) -> StoreResult<StatsResponse> {
    let mut counts = BTreeMap::new();
    for kind in EntityKind::ALL {
        counts.insert(kind, store.count(kind).await?);
    }

    Ok(StatsResponse {
        backend: store.backend().to_string(),
        total: counts.values().sum(),
        counts,
    })
}
