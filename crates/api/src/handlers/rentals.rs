use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use vidly_common::{validation::RentalInput, Document, Rental};

use super::{body_id, parse_id};
use crate::{error::ApiError, middleware::ValidatedJson, rentals, AppState};

/// Rentals, most recent first
pub async fn list_rentals_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Rental>>, ApiError> {
    let rentals = state.repo.all::<Rental>().await?;
    Ok(Json(rentals))
}

pub async fn get_rental_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Rental>, ApiError> {
    let id = parse_id::<Rental>(&id)?;

    state
        .repo
        .find::<Rental>(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(Rental::KIND))
}

/// Rent a movie to a customer, taking one copy out of stock
pub async fn create_rental_handler(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<RentalInput>,
) -> Result<Json<Rental>, ApiError> {
    let customer_id = body_id(payload.customer_id.as_deref(), "customerId")?;
    let movie_id = body_id(payload.movie_id.as_deref(), "movieId")?;

    let rental = rentals::create_rental(&state.repo, customer_id, movie_id).await?;
    Ok(Json(rental))
}
