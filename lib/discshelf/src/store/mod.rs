//! The local catalog of tracked titles.
//!
//! [`LibraryStore`] is the persistence seam; [`JsonLibraryStore`] is the
//! bundled implementation and [`Catalog`] adds the locking the resolver and
//! the sync engine rely on.

mod json;
mod locks;

pub use json::JsonLibraryStore;
pub use locks::{Catalog, KeyedLocks};

use async_trait::async_trait;
use chrono::Utc;
use itertools::Itertools;
use std::collections::BTreeMap;
use shared::{
    library::{GenreStats, LibraryStats},
    media::{MediaItem, MediaKey, MediaType},
};
use thiserror::Error;
use uuid::Uuid;

use crate::normalize::normalize;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("catalog IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("no catalog record with id {0}")]
    NotFound(Uuid),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// What an [`LibraryStore::upsert`] did with the incoming record.
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    Inserted(MediaItem),
    Updated(MediaItem),
    Unchanged(MediaItem),
}

impl UpsertOutcome {
    pub fn item(&self) -> &MediaItem {
        match self {
            UpsertOutcome::Inserted(item)
            | UpsertOutcome::Updated(item)
            | UpsertOutcome::Unchanged(item) => item,
        }
    }

    pub fn into_item(self) -> MediaItem {
        match self {
            UpsertOutcome::Inserted(item)
            | UpsertOutcome::Updated(item)
            | UpsertOutcome::Unchanged(item) => item,
        }
    }
}

#[async_trait]
pub trait LibraryStore: Send + Sync {
    async fn find_by_barcode(&self, barcode: &str) -> StoreResult<Option<MediaItem>>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<MediaItem>>;

    /// Candidate set for the fuzzy matcher: records sharing a word with the
    /// query plus every record of `media_type`. The year never filters.
    async fn search(
        &self,
        normalized_title: &str,
        year: Option<i32>,
        media_type: Option<MediaType>,
    ) -> StoreResult<Vec<MediaItem>>;

    /// Insert, or merge into the matching record; see [`stage_upsert`].
    async fn upsert(&self, item: MediaItem) -> StoreResult<UpsertOutcome>;

    /// Upsert every record as one change: either the whole batch lands or,
    /// on error, none of it does.
    async fn upsert_batch(&self, items: Vec<MediaItem>) -> StoreResult<Vec<UpsertOutcome>>;

    /// Record a physical copy and attach `barcode`. Idempotent.
    async fn mark_physical(&self, id: Uuid, barcode: &str) -> StoreResult<MediaItem>;

    /// Explicit administrative flip of the physical flag.
    async fn toggle_physical(&self, id: Uuid) -> StoreResult<MediaItem>;

    async fn all(&self) -> StoreResult<Vec<MediaItem>>;

    async fn stats(&self) -> StoreResult<LibraryStats> {
        let items = self.all().await?;
        Ok(LibraryStats {
            movies: items
                .iter()
                .filter(|i| i.media_type == MediaType::Movie)
                .count(),
            series: items
                .iter()
                .filter(|i| i.media_type == MediaType::Series)
                .count(),
            dvds: items.iter().filter(|i| i.has_physical).count(),
        })
    }

    async fn genre_stats(&self) -> StoreResult<GenreStats> {
        let items = self.all().await?;
        let count_for = |media_type: Option<MediaType>| -> BTreeMap<String, usize> {
            items
                .iter()
                .filter(|i| media_type.is_none_or(|t| i.media_type == t))
                .flat_map(|i| i.genres.iter().cloned())
                .counts()
                .into_iter()
                .collect()
        };
        Ok(GenreStats {
            movies: count_for(Some(MediaType::Movie)),
            series: count_for(Some(MediaType::Series)),
            all: count_for(None),
        })
    }
}

/// Merge `incoming` into `existing`. Returns `None` when nothing would
/// change, so repeated syncs are no-ops.
///
/// Barcodes are unioned and the physical flag is OR-ed: a merge can never
/// lose a physical copy. Genres are replaced by a non-empty incoming set and
/// a known incoming year replaces the stored one. Id, title and source stay.
pub fn merge_records(existing: &MediaItem, incoming: &MediaItem) -> Option<MediaItem> {
    let mut merged = existing.clone();

    merged.barcodes.extend(incoming.barcodes.iter().cloned());
    merged.has_physical |= incoming.has_physical;
    if !incoming.genres.is_empty() {
        merged.genres = incoming.genres.clone();
    }
    if incoming.external_id.is_some() {
        merged.external_id = incoming.external_id;
    }
    if incoming.year.is_some() {
        merged.year = incoming.year;
    }

    if merged == *existing {
        None
    } else {
        merged.updated_at = Utc::now();
        Some(merged)
    }
}

pub(crate) fn has_key(item: &MediaItem, key: &MediaKey) -> bool {
    item.media_type == key.media_type
        && item.year == key.year
        && item.normalized_title == key.normalized_title
}

/// Apply one upsert to an in-memory snapshot of the catalog.
///
/// A record carrying a manager id is matched on (manager id, type) first, so
/// a manager correcting a year updates the record in place. Everything else
/// is matched on the uniqueness key. When the refreshed year makes the record
/// collide with another one, the other record's barcodes and physical flag
/// are folded in and it is removed.
pub(crate) fn stage_upsert(
    items: &mut BTreeMap<Uuid, MediaItem>,
    mut incoming: MediaItem,
) -> UpsertOutcome {
    incoming.normalized_title = normalize(&incoming.title);
    let key = incoming.key();

    let existing = incoming
        .external_id
        .and_then(|external_id| {
            items.values().find(|i| {
                i.media_type == incoming.media_type && i.external_id == Some(external_id)
            })
        })
        .or_else(|| items.values().find(|i| has_key(i, &key)))
        .cloned();
    let Some(existing) = existing else {
        items.insert(incoming.id, incoming.clone());
        return UpsertOutcome::Inserted(incoming);
    };

    let mut merged = merge_records(&existing, &incoming).unwrap_or_else(|| existing.clone());
    let merged_key = merged.key();
    let twin = items
        .values()
        .find(|i| i.id != merged.id && has_key(i, &merged_key))
        .map(|i| i.id);
    if let Some(twin) = twin.and_then(|id| items.remove(&id)) {
        merged.barcodes.extend(twin.barcodes);
        merged.has_physical |= twin.has_physical;
        if merged.genres.is_empty() {
            merged.genres = twin.genres;
        }
        merged.added_at = merged.added_at.min(twin.added_at);
        merged.updated_at = Utc::now();
    }

    if merged == existing {
        return UpsertOutcome::Unchanged(existing);
    }
    items.insert(merged.id, merged.clone());
    UpsertOutcome::Updated(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::new_media_item;
    use shared::media::MediaSource;

    #[test]
    fn test_merge_keeps_physical_and_barcodes() {
        let mut existing = new_media_item("Alien", MediaType::Movie, Some(1979), MediaSource::Barcode);
        existing.has_physical = true;
        existing.barcodes.insert("111".to_string());

        let mut incoming = new_media_item("Alien", MediaType::Movie, Some(1979), MediaSource::Radarr);
        incoming.external_id = Some(7);
        incoming.genres.insert("Horror".to_string());

        let merged = merge_records(&existing, &incoming).unwrap();
        assert!(merged.has_physical);
        assert!(merged.has_barcode("111"));
        assert_eq!(merged.external_id, Some(7));
        assert_eq!(merged.id, existing.id);
        assert_eq!(merged.source, MediaSource::Barcode);
        assert!(merged.genres.contains("Horror"));
    }

    #[test]
    fn test_merge_without_changes_is_none() {
        let existing = new_media_item("Alien", MediaType::Movie, Some(1979), MediaSource::Radarr);
        let incoming = new_media_item("Alien", MediaType::Movie, Some(1979), MediaSource::Radarr);
        assert!(merge_records(&existing, &incoming).is_none());
    }

    #[test]
    fn test_merge_empty_genres_do_not_wipe() {
        let mut existing = new_media_item("Alien", MediaType::Movie, Some(1979), MediaSource::Radarr);
        existing.genres.insert("Horror".to_string());
        let incoming = new_media_item("Alien", MediaType::Movie, Some(1979), MediaSource::Radarr);
        assert!(merge_records(&existing, &incoming).is_none());
    }

    #[test]
    fn test_merge_refreshes_year() {
        let existing = new_media_item("Heat", MediaType::Movie, Some(1995), MediaSource::Radarr);
        let incoming = new_media_item("Heat", MediaType::Movie, Some(1996), MediaSource::Radarr);
        assert_eq!(merge_records(&existing, &incoming).unwrap().year, Some(1996));

        // an unknown year never wipes a known one
        let incoming = new_media_item("Heat", MediaType::Movie, None, MediaSource::Radarr);
        assert!(merge_records(&existing, &incoming).is_none());
    }

    fn managed(title: &str, year: i32, external_id: i64) -> MediaItem {
        let mut item = new_media_item(title, MediaType::Movie, Some(year), MediaSource::Radarr);
        item.external_id = Some(external_id);
        item
    }

    #[test]
    fn test_stage_upsert_follows_manager_id() {
        let mut items = BTreeMap::new();
        let first = stage_upsert(&mut items, managed("Heat", 1995, 5)).into_item();

        let corrected = stage_upsert(&mut items, managed("Heat", 1996, 5));
        assert!(matches!(corrected, UpsertOutcome::Updated(_)));
        assert_eq!(items.len(), 1);
        let heat = &items[&first.id];
        assert_eq!(heat.year, Some(1996));

        // same id under the other type is a different title
        let mut series = managed("Heat", 1996, 5);
        series.media_type = MediaType::Series;
        assert!(matches!(stage_upsert(&mut items, series), UpsertOutcome::Inserted(_)));
    }

    #[test]
    fn test_stage_upsert_folds_colliding_record() {
        let mut items = BTreeMap::new();
        let synced = stage_upsert(&mut items, managed("Heat", 1995, 5)).into_item();

        let mut scanned = new_media_item("Heat", MediaType::Movie, Some(1996), MediaSource::Barcode);
        scanned.has_physical = true;
        scanned.barcodes.insert("555".to_string());
        stage_upsert(&mut items, scanned);
        assert_eq!(items.len(), 2);

        let outcome = stage_upsert(&mut items, managed("Heat", 1996, 5));
        let merged = outcome.into_item();
        assert_eq!(items.len(), 1);
        assert_eq!(merged.id, synced.id);
        assert_eq!(merged.year, Some(1996));
        assert!(merged.has_physical);
        assert!(merged.has_barcode("555"));
    }
}
