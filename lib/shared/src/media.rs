use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Series,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Series => "series",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a catalog record was first created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaSource {
    Radarr,
    Sonarr,
    Barcode,
}

/// Uniqueness key of a catalog record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MediaKey {
    pub normalized_title: String,
    pub year: Option<i32>,
    pub media_type: MediaType,
}

/// One title the household is tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: Uuid,
    pub title: String,
    pub normalized_title: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub year: Option<i32>,
    #[serde(default)]
    pub genres: BTreeSet<String>,
    pub external_id: Option<i64>,
    #[serde(default)]
    pub barcodes: BTreeSet<String>,
    pub has_physical: bool,
    pub source: MediaSource,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MediaItem {
    pub fn key(&self) -> MediaKey {
        MediaKey {
            normalized_title: self.normalized_title.clone(),
            year: self.year,
            media_type: self.media_type,
        }
    }

    pub fn has_barcode(&self, barcode: &str) -> bool {
        self.barcodes.contains(barcode)
    }
}

/// A row as listed by a digital library manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagedItem {
    pub id: i64,
    pub media_type: MediaType,
    pub title: String,
    pub year: Option<i32>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub root_folder_path: Option<String>,
}

/// A manual resolution: the user confirmed what a scanned barcode is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddRequest {
    pub barcode: String,
    pub title: String,
    pub year: Option<i32>,
    #[serde(rename = "type")]
    pub media_type: MediaType,
}
