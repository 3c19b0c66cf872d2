//! Request payload validation
//!
//! Each payload type lists its field rules as `validator` attributes. Fields are
//! `Option`s so that a missing or `null` value is reported through the same
//! message list as any other rule instead of failing deserialization. Unknown
//! fields are rejected by serde before the rules run.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

/// North American phone number, optionally prefixed with a country code.
/// Digits and separators are ASCII only.
pub static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\+[0-9]{1,2}[[:space:]])?\(?[0-9]{3}\)?[[:space:].-][0-9]{3}[[:space:].-][0-9]{4}$")
        .expect("phone pattern is a valid regex")
});

/// Check that a string parses as an entity identifier
pub fn validate_entity_id(value: &str) -> Result<(), ValidationError> {
    Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|_| ValidationError::new("entity_id"))
}

fn validate_phone(value: &str) -> Result<(), ValidationError> {
    if PHONE_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new("phone"))
    }
}

/// Flatten validation failures into one client-facing message.
///
/// Fields are reported in name order so the text is stable between runs.
pub fn error_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| match &err.message {
                Some(message) => message.to_string(),
                None => format!("\"{}\" is invalid", field),
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct GenreInput {
    #[validate(
        required(message = "\"name\" is required"),
        length(min = 5, max = 50, message = "\"name\" length must be between 5 and 50 characters")
    )]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CustomerInput {
    #[validate(
        required(message = "\"name\" is required"),
        length(min = 3, max = 50, message = "\"name\" length must be between 3 and 50 characters")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "\"phone\" is required"),
        custom(function = "validate_phone", message = "\"phone\" must be a valid phone number")
    )]
    pub phone: Option<String>,

    pub is_gold: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct MovieInput {
    #[validate(
        required(message = "\"name\" is required"),
        length(min = 3, max = 50, message = "\"name\" length must be between 3 and 50 characters")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "\"genreId\" is required"),
        custom(function = "validate_entity_id", message = "\"genreId\" must be a valid id")
    )]
    pub genre_id: Option<String>,

    #[validate(
        required(message = "\"numberInStock\" is required"),
        range(min = 0, max = 255, message = "\"numberInStock\" must be between 0 and 255")
    )]
    pub number_in_stock: Option<i64>,

    #[validate(
        required(message = "\"dailyRentalRate\" is required"),
        range(min = 0.0, max = 255.0, message = "\"dailyRentalRate\" must be between 0 and 255")
    )]
    pub daily_rental_rate: Option<f64>,
}

impl MovieInput {
    /// Stock as stored; the range rule above keeps it within `u8`
    pub fn stock(&self) -> u8 {
        self.number_in_stock.unwrap_or_default().clamp(0, u8::MAX as i64) as u8
    }
}

/// Registration and account update payload
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UserInput {
    #[validate(
        required(message = "\"name\" is required"),
        length(min = 5, max = 50, message = "\"name\" length must be between 5 and 50 characters")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "\"email\" is required"),
        length(min = 5, max = 255, message = "\"email\" length must be between 5 and 255 characters"),
        email(message = "\"email\" must be a valid email")
    )]
    pub email: Option<String>,

    #[validate(
        required(message = "\"password\" is required"),
        length(min = 5, max = 1024, message = "\"password\" length must be between 5 and 1024 characters")
    )]
    pub password: Option<String>,
}

/// Login payload
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    #[validate(
        required(message = "\"email\" is required"),
        length(min = 5, max = 255, message = "\"email\" length must be between 5 and 255 characters"),
        email(message = "\"email\" must be a valid email")
    )]
    pub email: Option<String>,

    #[validate(
        required(message = "\"password\" is required"),
        length(min = 5, max = 1024, message = "\"password\" length must be between 5 and 1024 characters")
    )]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct RentalInput {
    #[validate(
        required(message = "\"customerId\" is required"),
        custom(function = "validate_entity_id", message = "\"customerId\" must be a valid id")
    )]
    pub customer_id: Option<String>,

    #[validate(
        required(message = "\"movieId\" is required"),
        custom(function = "validate_entity_id", message = "\"movieId\" must be a valid id")
    )]
    pub movie_id: Option<String>,
}
