use thiserror::Error;

use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, DiscshelfError>;

#[derive(Debug, Error)]
pub enum DiscshelfError {
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("service is not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },

    #[error("{manager} is unavailable: {message}")]
    ManagerUnavailable { manager: String, message: String },

    #[error("no lookup result for '{term}'")]
    NoLookupResult { term: String },
}

impl DiscshelfError {
    /// Whether a retry could plausibly succeed (network trouble, 5xx, rate limiting).
    pub fn is_transient(&self) -> bool {
        match self {
            DiscshelfError::Api { status, .. } => *status == 429 || *status >= 500,
            DiscshelfError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            DiscshelfError::Timeout { .. } => true,
            _ => false,
        }
    }
}
