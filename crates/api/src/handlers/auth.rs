use anyhow::Context;
use axum::{extract::State, response::Response, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use vidly_common::{validation::Credentials, Error, User};

use super::users::with_token;
use crate::{
    auth::{self, Identity},
    error::ApiError,
    middleware::{RequireAuth, ValidatedJson},
    AppState,
};

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

fn token_response(state: &AppState, identity: &Identity) -> Result<Response, ApiError> {
    let token = state.tokens.issue(identity)?;
    with_token(&token, Json(TokenResponse { token: token.clone() }))
}

/// Exchange email and password for an identity token
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ValidatedJson(credentials): ValidatedJson<Credentials>,
) -> Result<Response, ApiError> {
    let email = credentials.email.unwrap_or_default();
    let password = credentials.password.unwrap_or_default();

    let Some(user) = state.repo.find_user_by_email(&email).await? else {
        debug!("Login for unknown email");
        return Err(Error::InvalidCredentials.into());
    };

    let hash = user.password.clone();
    let valid = tokio::task::spawn_blocking(move || auth::verify_password(&password, &hash))
        .await
        .context("Password verification task failed")?;

    if !valid {
        debug!("Login with wrong password for user {}", user.id);
        return Err(Error::InvalidCredentials.into());
    }

    info!("User logged in: {}", user.id);
    token_response(&state, &Identity::from(&user))
}

/// Trade a still-valid token for a fresh one, picking up changes to the account
pub async fn refresh_token_handler(
    State(state): State<Arc<AppState>>,
    RequireAuth(identity): RequireAuth,
) -> Result<Response, ApiError> {
    let user = state
        .repo
        .find::<User>(identity.id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid token.".to_string()))?;

    token_response(&state, &Identity::from(&user))
}
