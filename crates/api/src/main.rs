//! Vidly Rental API
//!
//! REST API for genres, customers, movies, rentals and users

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vidly_api::{
    create_router, AppState, Config, DocumentStore, MemoryStore, RedisStore, StorageBackend,
    TokenManager,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vidly_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    info!("Starting Vidly Rental API");
    info!("Storage backend: {:?}", config.storage_backend);
    info!("Listening on {}", config.api_address());

    let store: Arc<dyn DocumentStore> = match config.storage_backend {
        StorageBackend::Redis => {
            info!("Redis URL: {}", config.redis_url);
            Arc::new(
                RedisStore::new(&config.redis_url)
                    .await
                    .context("Failed to initialize storage")?,
            )
        }
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
    };

    let tokens = TokenManager::new(&config.jwt_private_key, config.token_ttl_secs);
    let app = create_router(AppState::new(store, tokens));

    let addr = config.api_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    info!("Vidly Rental API running on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
