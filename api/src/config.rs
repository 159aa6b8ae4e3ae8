//! Centralized configuration management.
//!
//! All environment variables are read once at startup into [`AppConfig`], so a
//! missing setting fails the boot instead of the first request that needs it.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: '{value}'")]
    Invalid { name: &'static str, value: String },

    #[error("cannot assemble services: {0}")]
    Services(&'static str),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Radarr base URL (required)
    pub radarr_url: String,
    pub radarr_api_key: String,
    /// Sonarr base URL (required)
    pub sonarr_url: String,
    pub sonarr_api_key: String,
    /// Radarr root folder for added movies (default: "/movies")
    pub movie_root: String,
    /// Sonarr root folder for added series (default: "/tv")
    pub tv_root: String,
    /// Quality profile used when adding titles (default: 1)
    pub quality_profile_id: i64,
    /// Sonarr v3 language profile, omitted when unset
    pub language_profile_id: Option<i64>,
    /// UPC lookup service base URL (default: the public UPCitemdb trial endpoint)
    pub upc_lookup_url: Option<String>,
    pub upc_api_key: Option<String>,
    /// Catalog file (default: "catalog.json")
    pub catalog_path: PathBuf,
    /// Reconcile with the managers before serving (default: true)
    pub sync_on_startup: bool,
    /// HTTP server bind address (default: "0.0.0.0")
    pub ip: String,
    /// HTTP server port (default: 5000)
    pub port: u16,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

fn optional(name: &'static str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    optional(name)
        .map(|value| {
            value
                .parse()
                .map_err(|_| ConfigError::Invalid { name, value })
        })
        .transpose()
}

fn flag(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match optional(name).map(|v| v.to_lowercase()) {
        None => Ok(default),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
        Some(value) => Err(ConfigError::Invalid { name, value }),
    }
}

impl AppConfig {
    /// Load configuration from the environment (and a `.env` file, if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            radarr_url: required("RADARR_URL")?,
            radarr_api_key: required("RADARR_API_KEY")?,
            sonarr_url: required("SONARR_URL")?,
            sonarr_api_key: required("SONARR_API_KEY")?,
            movie_root: optional("MOVIE_ROOT").unwrap_or_else(|| "/movies".to_string()),
            tv_root: optional("TV_ROOT").unwrap_or_else(|| "/tv".to_string()),
            quality_profile_id: parsed("QUALITY_PROFILE_ID")?.unwrap_or(1),
            language_profile_id: parsed("LANGUAGE_PROFILE_ID")?,
            upc_lookup_url: optional("UPC_LOOKUP_URL"),
            upc_api_key: optional("UPC_API_KEY"),
            catalog_path: PathBuf::from(
                optional("CATALOG_PATH").unwrap_or_else(|| "catalog.json".to_string()),
            ),
            sync_on_startup: flag("SYNC_ON_STARTUP", true)?,
            ip: optional("IP").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parsed("PORT")?.unwrap_or(5000),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}
