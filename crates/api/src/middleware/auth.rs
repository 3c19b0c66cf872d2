//! Authentication and authorization extractors.
//!
//! Handlers opt into a gate by taking one of these extractors as an argument.
//! List it before the body extractor so a missing token is reported before a
//! malformed body.

use axum::{extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

use crate::auth::{AuthError, Identity, AUTH_HEADER};
use crate::error::ApiError;
use crate::AppState;

/// Extractor that requires a valid identity token.
///
/// Rejects with 401 if the `x-auth-token` header is missing or the token does
/// not verify. The decoded identity is also stored in the request extensions.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireAuth(identity): RequireAuth) -> String {
///     format!("Hello, {}!", identity.name)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuth(pub Identity);

impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Identity>() {
            return Ok(Self(identity.clone()));
        }

        let token = parts
            .headers
            .get(AUTH_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let identity = state.tokens.verify(token)?;
        parts.extensions.insert(identity.clone());

        Ok(Self(identity))
    }
}

/// Extractor that requires a valid token whose identity is an admin.
///
/// Authenticates exactly like [`RequireAuth`] first, so an anonymous request
/// still gets 401; an authenticated non-admin gets 403.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub Identity);

impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(identity) = RequireAuth::from_request_parts(parts, state).await?;

        if !identity.is_admin {
            return Err(ApiError::Forbidden("Access denied.".to_string()));
        }

        Ok(Self(identity))
    }
}
