use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use shared::{
    library::{GenreStats, LibraryStats, SyncReport},
    media::MediaItem,
};
use tracing::info;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

pub async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<LibraryStats>, ApiError> {
    Ok(Json(state.catalog().store().stats().await?))
}

pub async fn genre_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<GenreStats>, ApiError> {
    Ok(Json(state.catalog().store().genre_stats().await?))
}

pub async fn list_media(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MediaItem>>, ApiError> {
    Ok(Json(state.catalog().store().all().await?))
}

/// Flip the physical-copy flag of one record.
pub async fn toggle_physical(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<MediaItem>, ApiError> {
    let item = state.catalog().toggle_physical(id).await?;
    info!("'{}' physical copy set to {}", item.title, item.has_physical);
    Ok(Json(item))
}

pub async fn sync(State(state): State<Arc<AppState>>) -> Result<Json<SyncReport>, ApiError> {
    Ok(Json(state.sync().await?))
}
