//! HTTP surface for the disc shelf: scanning, catalog browsing and sync.

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{AppConfig, ConfigError};
pub use state::AppState;

/// Build the API router with all routes.
pub fn router(state: Arc<AppState>) -> Router {
    // the scanner UI is served from elsewhere
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(handlers::system::health))
        .route("/api/system/backends", get(handlers::system::backends))
        .route("/api/stats", get(handlers::library::stats))
        .route("/api/genre-stats", get(handlers::library::genre_stats))
        .route(
            "/api/media",
            get(handlers::library::list_media).post(handlers::scan::add_media),
        )
        .route(
            "/api/media/{id}/physical",
            post(handlers::library::toggle_physical),
        )
        .route("/api/scan", post(handlers::scan::scan))
        .route("/api/sync", post(handlers::library::sync))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
