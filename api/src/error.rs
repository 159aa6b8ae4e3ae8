use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use discshelf::{DiscshelfError, Resolution, ScanFailure, StoreError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Core(#[from] DiscshelfError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Core(DiscshelfError::Store(StoreError::NotFound(_))) => StatusCode::NOT_FOUND,
            ApiError::Core(DiscshelfError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Core(_) => StatusCode::BAD_GATEWAY,
        };
        tracing::error!("{}", self);
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn failure_status(failure: ScanFailure) -> StatusCode {
    match failure {
        ScanFailure::InvalidRequest => StatusCode::BAD_REQUEST,
        ScanFailure::LookupMiss | ScanFailure::Ambiguous => StatusCode::NOT_FOUND,
        ScanFailure::Collaborator => StatusCode::BAD_GATEWAY,
        ScanFailure::Store => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Failed resolutions still carry the whole trace in the body.
impl IntoResponse for ResolutionResponse {
    fn into_response(self) -> Response {
        let status = self
            .0
            .failure
            .map(failure_status)
            .unwrap_or(StatusCode::OK);
        (status, Json(self.0.result)).into_response()
    }
}

pub struct ResolutionResponse(pub Resolution);
