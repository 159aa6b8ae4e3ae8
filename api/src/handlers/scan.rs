use std::sync::Arc;

use axum::{extract::State, Json};
use shared::{media::AddRequest, scan::ScanRequest};

use crate::{error::ResolutionResponse, state::AppState};

pub async fn scan(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScanRequest>,
) -> ResolutionResponse {
    ResolutionResponse(state.resolver.scan(&request.barcode).await)
}

pub async fn add_media(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddRequest>,
) -> ResolutionResponse {
    ResolutionResponse(state.resolver.add(&request).await)
}
