use shared::media::{MediaItem, MediaKey};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use super::{LibraryStore, StoreError, StoreResult};

/// One async mutex per uniqueness key, created on demand.
///
/// Entries nobody holds are pruned whenever a new lock is handed out.
#[derive(Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<MediaKey, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: &MediaKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}

/// A [`LibraryStore`] plus the coordination scans and syncs share.
///
/// Scans hold the shared side of the gate for their whole run and a key lock
/// around each read-decide-write; a sync holds the exclusive side, so a scan
/// never observes a half-reconciled catalog.
pub struct Catalog {
    store: Arc<dyn LibraryStore>,
    gate: RwLock<()>,
    keys: KeyedLocks,
}

impl Catalog {
    pub fn new(store: Arc<dyn LibraryStore>) -> Self {
        Self {
            store,
            gate: RwLock::new(()),
            keys: KeyedLocks::new(),
        }
    }

    pub fn store(&self) -> &dyn LibraryStore {
        self.store.as_ref()
    }

    pub async fn scan_gate(&self) -> RwLockReadGuard<'_, ()> {
        self.gate.read().await
    }

    pub async fn sync_gate(&self) -> RwLockWriteGuard<'_, ()> {
        self.gate.write().await
    }

    pub async fn lock_key(&self, key: &MediaKey) -> OwnedMutexGuard<()> {
        self.keys.lock(key).await
    }

    /// Administrative flip of a record's physical flag, serialized with scans
    /// touching the same record.
    pub async fn toggle_physical(&self, id: Uuid) -> StoreResult<MediaItem> {
        let _gate = self.scan_gate().await;
        let item = self.store.get(id).await?.ok_or(StoreError::NotFound(id))?;
        let _key = self.lock_key(&item.key()).await;
        self.store.toggle_physical(id).await
    }
}
