use chrono::Utc;
use shared::media::{ManagedItem, MediaItem, MediaSource, MediaType};
use uuid::Uuid;

use crate::normalize::normalize;

/// A fresh catalog record with its matching title derived from `title`.
pub fn new_media_item(
    title: &str,
    media_type: MediaType,
    year: Option<i32>,
    source: MediaSource,
) -> MediaItem {
    let now = Utc::now();
    MediaItem {
        id: Uuid::new_v4(),
        title: title.trim().to_string(),
        normalized_title: normalize(title),
        media_type,
        year,
        genres: Default::default(),
        external_id: None,
        barcodes: Default::default(),
        has_physical: false,
        source,
        added_at: now,
        updated_at: now,
    }
}

/// Digital-only record for a row listed by a library manager.
pub fn from_managed(managed: &ManagedItem) -> MediaItem {
    let source = match managed.media_type {
        MediaType::Movie => MediaSource::Radarr,
        MediaType::Series => MediaSource::Sonarr,
    };
    let mut item = new_media_item(&managed.title, managed.media_type, managed.year, source);
    item.external_id = Some(managed.id);
    item.genres = managed.genres.iter().cloned().collect();
    item
}
