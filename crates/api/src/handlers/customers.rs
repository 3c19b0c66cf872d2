use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tracing::info;
use vidly_common::{validation::CustomerInput, Customer, Document};

use super::parse_id;
use crate::{error::ApiError, middleware::ValidatedJson, AppState};

pub async fn list_customers_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    let customers = state.repo.all::<Customer>().await?;
    Ok(Json(customers))
}

pub async fn get_customer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Customer>, ApiError> {
    let id = parse_id::<Customer>(&id)?;

    state
        .repo
        .find::<Customer>(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(Customer::KIND))
}

pub async fn create_customer_handler(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<CustomerInput>,
) -> Result<Json<Customer>, ApiError> {
    let customer = Customer::new(
        payload.name.unwrap_or_default(),
        payload.phone.unwrap_or_default(),
        payload.is_gold.unwrap_or(false),
    );
    state.repo.insert(&customer).await?;

    info!("Customer created: {}", customer.id);
    Ok(Json(customer))
}

pub async fn update_customer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<CustomerInput>,
) -> Result<Json<Customer>, ApiError> {
    let id = parse_id::<Customer>(&id)?;
    let customer = Customer {
        id,
        name: payload.name.unwrap_or_default(),
        phone: payload.phone.unwrap_or_default(),
        is_gold: payload.is_gold.unwrap_or(false),
    };

    if !state.repo.replace(&customer).await? {
        return Err(ApiError::not_found(Customer::KIND));
    }

    info!("Customer updated: {}", customer.id);
    Ok(Json(customer))
}

pub async fn delete_customer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Customer>, ApiError> {
    let id = parse_id::<Customer>(&id)?;

    let customer = state
        .repo
        .remove::<Customer>(id)
        .await?
        .ok_or_else(|| ApiError::not_found(Customer::KIND))?;

    info!("Customer deleted: {}", customer.id);
    Ok(Json(customer))
}
