use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tracing::info;
use vidly_common::{validation::MovieInput, Document, Error, Genre, Movie};

use super::{body_id, parse_id};
use crate::{error::ApiError, middleware::ValidatedJson, storage::Repository, AppState};

/// Resolve the genre named by the payload, snapshotting it for embedding
async fn resolve_genre(repo: &Repository, payload: &MovieInput) -> Result<Genre, ApiError> {
    let genre_id = body_id(payload.genre_id.as_deref(), "genreId")?;

    repo.find::<Genre>(genre_id)
        .await?
        .ok_or_else(|| Error::InvalidGenre.into())
}

pub async fn list_movies_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Movie>>, ApiError> {
    let movies = state.repo.all::<Movie>().await?;
    Ok(Json(movies))
}

pub async fn get_movie_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Movie>, ApiError> {
    let id = parse_id::<Movie>(&id)?;

    state
        .repo
        .find::<Movie>(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(Movie::KIND))
}

pub async fn create_movie_handler(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<MovieInput>,
) -> Result<Json<Movie>, ApiError> {
    let genre = resolve_genre(&state.repo, &payload).await?;

    let movie = Movie::new(
        payload.name.clone().unwrap_or_default(),
        genre,
        payload.stock(),
        payload.daily_rental_rate.unwrap_or_default(),
    );
    state.repo.insert(&movie).await?;

    info!("Movie created: {} ({})", movie.id, movie.name);
    Ok(Json(movie))
}

/// Overwrite a movie, including its stock and a fresh genre snapshot
pub async fn update_movie_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<MovieInput>,
) -> Result<Json<Movie>, ApiError> {
    let id = parse_id::<Movie>(&id)?;
    let genre = resolve_genre(&state.repo, &payload).await?;

    let movie = Movie {
        id,
        name: payload.name.clone().unwrap_or_default(),
        genre,
        number_in_stock: payload.stock(),
        daily_rental_rate: payload.daily_rental_rate.unwrap_or_default(),
    };

    if !state.repo.replace(&movie).await? {
        return Err(ApiError::not_found(Movie::KIND));
    }

    info!("Movie updated: {}", movie.id);
    Ok(Json(movie))
}

pub async fn delete_movie_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Movie>, ApiError> {
    let id = parse_id::<Movie>(&id)?;

    let movie = state
        .repo
        .remove::<Movie>(id)
        .await?
        .ok_or_else(|| ApiError::not_found(Movie::KIND))?;

    info!("Movie deleted: {}", movie.id);
    Ok(Json(movie))
}
