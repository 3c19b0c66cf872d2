use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tracing::info;
use vidly_common::{validation::GenreInput, Document, Genre};

use super::parse_id;
use crate::{
    error::ApiError,
    middleware::{RequireAdmin, RequireAuth, ValidatedJson},
    AppState,
};

/// List all genres by name
pub async fn list_genres_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Genre>>, ApiError> {
    let genres = state.repo.all::<Genre>().await?;
    Ok(Json(genres))
}

pub async fn get_genre_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Genre>, ApiError> {
    let id = parse_id::<Genre>(&id)?;

    match state.repo.find::<Genre>(id).await? {
        Some(genre) => Ok(Json(genre)),
        None => Err(ApiError::not_found(Genre::KIND)),
    }
}

/// Create a genre; any signed-in user may do this
pub async fn create_genre_handler(
    State(state): State<Arc<AppState>>,
    RequireAuth(identity): RequireAuth,
    ValidatedJson(payload): ValidatedJson<GenreInput>,
) -> Result<Json<Genre>, ApiError> {
    let genre = Genre::new(payload.name.unwrap_or_default());
    state.repo.insert(&genre).await?;

    info!("Genre {} created by user {}", genre.id, identity.id);
    Ok(Json(genre))
}

/// Rename a genre. Movies keep the genre snapshot they were written with.
pub async fn update_genre_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin(identity): RequireAdmin,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<GenreInput>,
) -> Result<Json<Genre>, ApiError> {
    let id = parse_id::<Genre>(&id)?;
    let genre = Genre {
        id,
        name: payload.name.unwrap_or_default(),
    };

    if !state.repo.replace(&genre).await? {
        return Err(ApiError::not_found(Genre::KIND));
    }

    info!("Genre {} updated by admin {}", genre.id, identity.id);
    Ok(Json(genre))
}

pub async fn delete_genre_handler(
    State(state): State<Arc<AppState>>,
    RequireAdmin(identity): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Genre>, ApiError> {
    let id = parse_id::<Genre>(&id)?;

    match state.repo.remove::<Genre>(id).await? {
        Some(genre) => {
            info!("Genre {} deleted by admin {}", genre.id, identity.id);
            Ok(Json(genre))
        }
        None => Err(ApiError::not_found(Genre::KIND)),
    }
}
