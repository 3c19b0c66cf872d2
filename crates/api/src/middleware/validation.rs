use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;
use vidly_common::validation::error_message;

use crate::error::ApiError;

/// JSON body extractor that also runs the payload's validation rules.
///
/// Malformed JSON, wrong field types, unknown fields and rule violations all
/// reject with 400 and a readable message, before the handler runs.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;

        value
            .validate()
            .map_err(|errors| ApiError::Validation(error_message(&errors)))?;

        Ok(Self(value))
    }
}
