//! HTTP error responses.
//!
//! [`ApiError`] is the single conversion point from failures to responses. It is
//! also the only place that logs internal failures and emits 500s: the client
//! gets a generic message while the full cause chain goes to the log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::any::Any;
use tracing::error;

use crate::auth::AuthError;

/// Message returned for every internal failure
pub const INTERNAL_ERROR_MESSAGE: &str = "Something failed.";

#[derive(Debug)]
pub enum ApiError {
    /// Malformed request body
    Validation(String),

    /// Request violates a business rule
    BadRequest(String),

    NotFound(String),

    Unauthorized(String),

    Forbidden(String),

    Internal(anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Not-found error for a record kind, e.g. `ApiError::not_found("genre")`
    pub fn not_found(kind: &str) -> Self {
        ApiError::NotFound(format!("The {} with the given ID was not found.", kind))
    }
}

fn error_body(status: StatusCode, message: &str) -> Response {
    let body = serde_json::json!({
        "error": message
    });

    (status, Json(body)).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match self {
            ApiError::Internal(err) => {
                error!(error = ?err, "Request failed: {:#}", err);
                error_body(status, INTERNAL_ERROR_MESSAGE)
            }
            ApiError::Validation(message)
            | ApiError::BadRequest(message)
            | ApiError::NotFound(message)
            | ApiError::Unauthorized(message)
            | ApiError::Forbidden(message) => error_body(status, &message),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl From<vidly_common::Error> for ApiError {
    fn from(err: vidly_common::Error) -> Self {
        if err.is_business_rule() {
            return ApiError::BadRequest(err.to_string());
        }

        match err {
            vidly_common::Error::TransactionFailed(cause) => {
                ApiError::Internal(cause.context("Rental transaction failed"))
            }
            vidly_common::Error::Storage(cause) => ApiError::Internal(cause),
            other => ApiError::Internal(anyhow::Error::new(other)),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken | AuthError::Expired | AuthError::InvalidToken(_) => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::Signing(_) | AuthError::Hashing(_) | AuthError::Lifetime(_) => {
                ApiError::Internal(anyhow::anyhow!("{}", err))
            }
        }
    }
}

/// Turn a panic inside a request task into the generic 500, logging the payload.
///
/// Installed through `tower_http::catch_panic::CatchPanicLayer`, so a panicking
/// handler fails only its own request.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    error!(panic = %detail, "Request handler panicked");
    error_body(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
}
