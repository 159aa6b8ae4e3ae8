use std::sync::Arc;

use axum::{extract::State, Json};
use shared::system::{AvailableBackends, SystemHealth};

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> Json<SystemHealth> {
    Json(state.services().health().await)
}

pub async fn backends(State(state): State<Arc<AppState>>) -> Json<AvailableBackends> {
    Json(state.services().list_backends())
}
