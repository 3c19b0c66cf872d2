//! Vidly Rental API
//!
//! CRUD over genres, customers, movies and users, plus rental checkout that
//! snapshots the customer and movie and takes a copy out of stock atomically.
//!
//! Endpoints:
//! - `GET /health`
//! - `/api/genres`: list and fetch are open; create needs a token, update and delete need an admin
//! - `/api/customers`, `/api/movies`: open CRUD
//! - `/api/rentals`: create, list (newest first), fetch
//! - `/api/users`: register, `me`, admin listing, self-or-admin update, admin delete
//! - `/api/auth`: login and token refresh

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod rentals;
pub mod storage;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use auth::TokenManager;
pub use config::{Config, StorageBackend};
pub use storage::{DocumentStore, MemoryStore, RedisStore, Repository};

/// Shared application state
pub struct AppState {
    pub repo: Repository,
    pub tokens: TokenManager,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, tokens: TokenManager) -> Self {
        Self {
            repo: Repository::new(store),
            tokens,
        }
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let shared_state = Arc::new(state);

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route(
            "/api/genres",
            get(handlers::genres::list_genres_handler).post(handlers::genres::create_genre_handler),
        )
        .route(
            "/api/genres/{id}",
            get(handlers::genres::get_genre_handler)
                .put(handlers::genres::update_genre_handler)
                .delete(handlers::genres::delete_genre_handler),
        )
        .route(
            "/api/customers",
            get(handlers::customers::list_customers_handler)
                .post(handlers::customers::create_customer_handler),
        )
        .route(
            "/api/customers/{id}",
            get(handlers::customers::get_customer_handler)
                .put(handlers::customers::update_customer_handler)
                .delete(handlers::customers::delete_customer_handler),
        )
        .route(
            "/api/movies",
            get(handlers::movies::list_movies_handler).post(handlers::movies::create_movie_handler),
        )
        .route(
            "/api/movies/{id}",
            get(handlers::movies::get_movie_handler)
                .put(handlers::movies::update_movie_handler)
                .delete(handlers::movies::delete_movie_handler),
        )
        .route(
            "/api/rentals",
            get(handlers::rentals::list_rentals_handler)
                .post(handlers::rentals::create_rental_handler),
        )
        .route(
            "/api/rentals/{id}",
            get(handlers::rentals::get_rental_handler),
        )
        .route(
            "/api/users",
            get(handlers::users::list_users_handler).post(handlers::users::register_user_handler),
        )
        .route("/api/users/me", get(handlers::users::current_user_handler))
        .route(
            "/api/users/{id}",
            get(handlers::users::get_user_handler)
                .put(handlers::users::update_user_handler)
                .delete(handlers::users::delete_user_handler),
        )
        .route("/api/auth", post(handlers::auth::login_handler))
        .route("/api/auth/refresh", post(handlers::auth::refresh_token_handler))
        .with_state(shared_state)
        .layer(CatchPanicLayer::custom(error::handle_panic))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
