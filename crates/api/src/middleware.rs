//! Request extractors that run before handler logic: token authentication,
//! admin authorization and payload validation.

pub mod auth;
pub mod validation;

pub use auth::{RequireAdmin, RequireAuth};
pub use validation::ValidatedJson;
