use async_trait::async_trait;
use chrono::Utc;
use shared::media::{MediaItem, MediaType};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::{stage_upsert, LibraryStore, StoreError, StoreResult, UpsertOutcome};

/// Catalog held in memory and, when a path is given, mirrored to a JSON file.
///
/// Every mutation writes the full catalog to `<path>.tmp` and renames it over
/// `path` before the change becomes visible, so a failed write leaves both the
/// file and the in-memory record as they were.
pub struct JsonLibraryStore {
    path: Option<PathBuf>,
    items: RwLock<BTreeMap<Uuid, MediaItem>>,
}

async fn persist(path: &Path, mut records: Vec<&MediaItem>) -> StoreResult<()> {
    records.sort_by(|a, b| {
        (a.media_type, &a.normalized_title, a.year).cmp(&(b.media_type, &b.normalized_title, b.year))
    });
    let body = serde_json::to_vec_pretty(&records)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, body).await?;
    tokio::fs::rename(&tmp, path).await?;
    debug!("Catalog written to {:?} ({} records)", path, records.len());
    Ok(())
}

impl JsonLibraryStore {
    /// A catalog that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            items: RwLock::new(BTreeMap::new()),
        }
    }

    /// Load the catalog at `path`; a missing file is an empty catalog.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let items = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let records: Vec<MediaItem> = serde_json::from_slice(&bytes)?;
                records.into_iter().map(|item| (item.id, item)).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        info!("Loaded {} catalog records from {:?}", items.len(), path);
        Ok(Self {
            path: Some(path),
            items: RwLock::new(items),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn commit(&self, items: &mut BTreeMap<Uuid, MediaItem>, record: MediaItem) -> StoreResult<()> {
        if let Some(path) = &self.path {
            let mut snapshot: Vec<&MediaItem> =
                items.values().filter(|i| i.id != record.id).collect();
            snapshot.push(&record);
            persist(path, snapshot).await?;
        }
        items.insert(record.id, record);
        Ok(())
    }

    /// Swap in a staged copy of the whole catalog after writing it out.
    async fn replace(
        &self,
        items: &mut BTreeMap<Uuid, MediaItem>,
        staged: BTreeMap<Uuid, MediaItem>,
    ) -> StoreResult<()> {
        if let Some(path) = &self.path {
            persist(path, staged.values().collect()).await?;
        }
        *items = staged;
        Ok(())
    }
}

#[async_trait]
impl LibraryStore for JsonLibraryStore {
    async fn find_by_barcode(&self, barcode: &str) -> StoreResult<Option<MediaItem>> {
        let barcode = barcode.trim();
        let items = self.items.read().await;
        Ok(items.values().find(|i| i.has_barcode(barcode)).cloned())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<MediaItem>> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn search(
        &self,
        normalized_title: &str,
        _year: Option<i32>,
        media_type: Option<MediaType>,
    ) -> StoreResult<Vec<MediaItem>> {
        let words: HashSet<&str> = normalized_title.split_whitespace().collect();
        if words.is_empty() {
            return Ok(vec![]);
        }
        let items = self.items.read().await;
        Ok(items
            .values()
            .filter(|item| {
                media_type == Some(item.media_type)
                    || item
                        .normalized_title
                        .split_whitespace()
                        .any(|w| words.contains(w))
            })
            .cloned()
            .collect())
    }

    async fn upsert(&self, item: MediaItem) -> StoreResult<UpsertOutcome> {
        let mut items = self.items.write().await;
        let mut staged = items.clone();
        let outcome = stage_upsert(&mut staged, item);
        if !matches!(outcome, UpsertOutcome::Unchanged(_)) {
            self.replace(&mut items, staged).await?;
        }
        Ok(outcome)
    }

    async fn upsert_batch(&self, batch: Vec<MediaItem>) -> StoreResult<Vec<UpsertOutcome>> {
        let mut items = self.items.write().await;
        let mut staged = items.clone();
        let outcomes: Vec<UpsertOutcome> = batch
            .into_iter()
            .map(|item| stage_upsert(&mut staged, item))
            .collect();
        if outcomes
            .iter()
            .any(|o| !matches!(o, UpsertOutcome::Unchanged(_)))
        {
            self.replace(&mut items, staged).await?;
        }
        Ok(outcomes)
    }

    async fn mark_physical(&self, id: Uuid, barcode: &str) -> StoreResult<MediaItem> {
        let mut items = self.items.write().await;
        let mut record = items.get(&id).cloned().ok_or(StoreError::NotFound(id))?;

        let barcode = barcode.trim();
        let attached = barcode.is_empty() || record.has_barcode(barcode);
        if record.has_physical && attached {
            return Ok(record);
        }
        record.has_physical = true;
        if !barcode.is_empty() {
            record.barcodes.insert(barcode.to_string());
        }
        record.updated_at = Utc::now();

        self.commit(&mut items, record.clone()).await?;
        Ok(record)
    }

    async fn toggle_physical(&self, id: Uuid) -> StoreResult<MediaItem> {
        let mut items = self.items.write().await;
        let mut record = items.get(&id).cloned().ok_or(StoreError::NotFound(id))?;
        record.has_physical = !record.has_physical;
        record.updated_at = Utc::now();

        self.commit(&mut items, record.clone()).await?;
        Ok(record)
    }

    async fn all(&self) -> StoreResult<Vec<MediaItem>> {
        let items = self.items.read().await;
        let mut all: Vec<MediaItem> = items.values().cloned().collect();
        all.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.year.cmp(&b.year)));
        Ok(all)
    }
}
