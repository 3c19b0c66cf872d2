//! Configuration management for the rental API
//!
//! Loads configuration from environment variables with sensible defaults.

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Longest accepted token lifetime (one year)
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// Where entity documents are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Redis server at `redis_url`
    Redis,
    /// Process memory, lost on restart
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(StorageBackend::Redis),
            "memory" => Ok(StorageBackend::Memory),
            other => anyhow::bail!("Unknown STORAGE_BACKEND: {} (expected redis or memory)", other),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server host
    pub api_host: String,

    /// API server port
    pub api_port: u16,

    pub storage_backend: StorageBackend,

    /// Redis connection URL
    pub redis_url: String,

    /// Secret used to sign identity tokens
    pub jwt_private_key: String,

    /// Lifetime of issued tokens in seconds
    pub token_ttl_secs: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        let config = Config {
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),

            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("Invalid API_PORT")?,

            storage_backend: env::var("STORAGE_BACKEND")
                .unwrap_or_else(|_| "redis".to_string())
                .parse()?,

            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),

            jwt_private_key: env::var("JWT_PRIVATE_KEY")
                .context("FATAL ERROR: JWT_PRIVATE_KEY is not defined")?,

            token_ttl_secs: env::var("TOKEN_TTL_SECS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .context("Invalid TOKEN_TTL_SECS")?,
        };

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.api_port == 0 {
            anyhow::bail!("API_PORT must be greater than 0");
        }

        if self.jwt_private_key.is_empty() {
            anyhow::bail!("JWT_PRIVATE_KEY must not be empty");
        }

        if self.token_ttl_secs <= 0 {
            anyhow::bail!("TOKEN_TTL_SECS must be greater than 0");
        }

        if self.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            anyhow::bail!("TOKEN_TTL_SECS must be at most {}", MAX_TOKEN_TTL_SECS);
        }

        Ok(())
    }

    /// Get the API server address
    pub fn api_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}
