use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Counts shown on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LibraryStats {
    pub movies: usize,
    pub series: usize,
    /// Records with a physical copy
    pub dvds: usize,
}

/// Genre -> record count, split by media type
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenreStats {
    pub movies: BTreeMap<String, usize>,
    pub series: BTreeMap<String, usize>,
    pub all: BTreeMap<String, usize>,
}

/// Result of reconciling the catalog with the digital library managers
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncReport {
    pub added: usize,
    pub updated: usize,
    /// Managers that could not be reached during this run
    #[serde(default)]
    pub errors: Vec<String>,
}
