//! User accounts. Passwords are stored as Argon2 hashes and never returned.

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::HeaderValue,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::info;
use vidly_common::{validation::UserInput, Document, Error, User, UserProfile};

use super::parse_id;
use crate::{
    auth::{self, Identity, AUTH_HEADER},
    error::ApiError,
    middleware::{RequireAdmin, RequireAuth, ValidatedJson},
    storage::UserWrite,
    AppState,
};

/// Hash a password on the blocking pool
pub(crate) async fn hash_password(password: String) -> Result<String, ApiError> {
    let hash = tokio::task::spawn_blocking(move || auth::hash_password(&password))
        .await
        .context("Password hashing task failed")??;

    Ok(hash)
}

/// Attach `token` to a response as the auth header
pub(crate) fn with_token(token: &str, body: impl IntoResponse) -> Result<Response, ApiError> {
    let value = HeaderValue::from_str(token).context("Issued token is not a valid header value")?;

    let mut response = body.into_response();
    response.headers_mut().insert(AUTH_HEADER, value);
    Ok(response)
}

/// Register a new user and sign them in
pub async fn register_user_handler(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<UserInput>,
) -> Result<Response, ApiError> {
    let password_hash = hash_password(payload.password.unwrap_or_default()).await?;
    let user = User::new(
        payload.name.unwrap_or_default(),
        payload.email.unwrap_or_default(),
        password_hash,
    );

    match state.repo.register_user(&user).await? {
        UserWrite::Saved => {}
        UserWrite::EmailTaken => return Err(Error::DuplicateEmail.into()),
        UserWrite::Missing => return Err(ApiError::not_found(User::KIND)),
    }

    info!("User registered: {}", user.id);
    let token = state.tokens.issue(&Identity::from(&user))?;
    with_token(&token, Json(UserProfile::from(&user)))
}

/// Profile of the caller
pub async fn current_user_handler(
    State(state): State<Arc<AppState>>,
    RequireAuth(identity): RequireAuth,
) -> Result<Json<UserProfile>, ApiError> {
    state
        .repo
        .find::<User>(identity.id)
        .await?
        .map(|user| Json(UserProfile::from(&user)))
        .ok_or_else(|| ApiError::not_found(User::KIND))
}

pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    let users = state.repo.all::<User>().await?;
    Ok(Json(users.iter().map(UserProfile::from).collect()))
}

pub async fn get_user_handler(
    State(state): State<Arc<AppState>>,
    RequireAuth(_): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>, ApiError> {
    let id = parse_id::<User>(&id)?;

    state
        .repo
        .find::<User>(id)
        .await?
        .map(|user| Json(UserProfile::from(&user)))
        .ok_or_else(|| ApiError::not_found(User::KIND))
}

/// Update name, email and password. Users may edit themselves; admins anyone.
/// The admin flag itself is never changed through the API.
pub async fn update_user_handler(
    State(state): State<Arc<AppState>>,
    RequireAuth(identity): RequireAuth,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UserInput>,
) -> Result<Json<UserProfile>, ApiError> {
    let id = parse_id::<User>(&id)?;

    if identity.id != id && !identity.is_admin {
        return Err(ApiError::Forbidden("Access denied.".to_string()));
    }

    let existing = state
        .repo
        .find::<User>(id)
        .await?
        .ok_or_else(|| ApiError::not_found(User::KIND))?;

    let user = User {
        id,
        name: payload.name.unwrap_or_default(),
        email: payload.email.unwrap_or_default(),
        password: hash_password(payload.password.unwrap_or_default()).await?,
        is_admin: existing.is_admin,
    };

    match state.repo.update_user(&user, &existing.email).await? {
        UserWrite::Saved => {
            info!("User {} updated by {}", user.id, identity.id);
            Ok(Json(UserProfile::from(&user)))
        }
        UserWrite::EmailTaken => Err(Error::DuplicateEmail.into()),
        UserWrite::Missing => Err(ApiError::not_found(User::KIND)),
    }
}

pub async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin(identity): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>, ApiError> {
    let id = parse_id::<User>(&id)?;

    let user = state
        .repo
        .remove_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found(User::KIND))?;

    info!("User {} deleted by admin {}", user.id, identity.id);
    Ok(Json(UserProfile::from(&user)))
}
