//! Per-key async locks
//!
//! Serializes read-modify-write sequences on the same natural key inside one
//! process. Entries are held weakly so the table only keeps locks that some
//! task is currently holding or waiting on.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use asnmap_common::types::EntityKind;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

const PRUNE_THRESHOLD: usize = 1024;

type LockTable = HashMap<(EntityKind, String), Weak<AsyncMutex<()>>>;

#[derive(Default)]
pub struct KeyLocks {
    table: Mutex<LockTable>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `(kind, key)`.
    pub async fn lock(&self, kind: EntityKind, key: &str) -> OwnedMutexGuard<()> {
        let lock = self.entry(kind, key);
        lock.lock_owned().await
    }

    fn entry(&self, kind: EntityKind, key: &str) -> Arc<AsyncMutex<()>> {
        let mut table = self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if table.len() >= PRUNE_THRESHOLD {
            table.retain(|_, weak| weak.strong_count() > 0);
        }

        let slot = table.entry((kind, key.to_string())).or_default();
        match slot.upgrade() {
            Some(existing) => existing,
            None => {
                let fresh = Arc::new(AsyncMutex::new(()));
                *slot = Arc::downgrade(&fresh);
                fresh
            },
        }
    }

    #[cfg(test)]
    fn live_entries(&self) -> usize {
        let table = self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        table.values().filter(|weak| weak.strong_count() > 0).count()
    }
}
