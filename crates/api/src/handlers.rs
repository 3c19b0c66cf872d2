//! API request handlers

pub mod auth;
pub mod customers;
pub mod genres;
pub mod movies;
pub mod rentals;
pub mod users;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;
use vidly_common::Document;

use crate::{error::ApiError, AppState};

/// Health check endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.repo.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "healthy",
                "service": "vidly-api"
            })),
        ),
        Err(e) => {
            warn!("Health check failed: {:#}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "unavailable",
                    "service": "vidly-api"
                })),
            )
        }
    }
}

/// Parse a record id from the path. Malformed ids cannot match any record, so
/// they get the same 404 as an unknown id.
pub(crate) fn parse_id<T: Document>(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(T::KIND))
}

/// Parse an id from an already validated body field
pub(crate) fn body_id(raw: Option<&str>, field: &str) -> Result<Uuid, ApiError> {
    raw.and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| ApiError::Validation(format!("\"{}\" must be a valid id", field)))
}
