use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::media::{MediaItem, MediaType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Checking,
    Searching,
    Found,
    NotFound,
    Completed,
    Error,
}

/// One observation in a resolution trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanStep {
    pub action: String,
    pub status: StepStatus,
    pub details: Option<String>,
    #[serde(default)]
    pub matches: Vec<MatchCandidate>,
}

/// A ranked local record, as surfaced by the fuzzy matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub id: Uuid,
    pub title: String,
    pub year: Option<i32>,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub similarity: f64,
    pub has_physical: bool,
    /// The normalized title equals the query exactly.
    #[serde(default)]
    pub exact_title: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScanRequest {
    #[serde(default)]
    pub barcode: String,
}

/// Terminal output of the barcode pipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScanResult {
    pub barcode: String,
    pub steps: Vec<ScanStep>,
    pub success: bool,
    pub item: Option<MediaItem>,
    pub suggested_title: Option<String>,
    pub base_title: Option<String>,
    pub suggested_type: Option<MediaType>,
    pub local_results: Vec<MatchCandidate>,
    pub toggled: bool,
    pub updated: bool,
    pub error: Option<String>,
}

impl ScanResult {
    pub fn last_step(&self) -> Option<&ScanStep> {
        self.steps.last()
    }
}
