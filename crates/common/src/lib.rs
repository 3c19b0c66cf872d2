//! Shared domain types for the Vidly rental service: persisted records, request
//! validation and the domain error taxonomy.

pub mod error;
pub mod models;
pub mod validation;

pub use error::{Error, Result};
pub use models::{
    Collection, Customer, CustomerSnapshot, Document, Genre, Movie, MovieSnapshot, Rental, User,
    UserProfile,
};
