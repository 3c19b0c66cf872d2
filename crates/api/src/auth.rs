//! Identity tokens and password hashing.
//!
//! Tokens are HS256 JWTs carrying the user's id, name and admin flag. Every token
//! expires; clients holding a valid token can trade it for a fresh one.

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::{TimeDelta, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use vidly_common::User;

/// Header carrying the identity token on requests and registration responses
pub const AUTH_HEADER: &str = "x-auth-token";

/// Claims proven by a valid token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub is_admin: bool,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            is_admin: user.is_admin,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    identity: Identity,

    /// Issued at (Unix timestamp)
    iat: i64,

    /// Expiration (Unix timestamp)
    exp: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Access denied. No token provided.")]
    MissingToken,

    #[error("Token expired.")]
    Expired,

    #[error("Invalid token.")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),

    #[error("Failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("Failed to hash password: {0}")]
    Hashing(argon2::password_hash::Error),

    #[error("Token lifetime of {0} seconds is out of range")]
    Lifetime(i64),
}

/// Issues and verifies identity tokens
#[derive(Clone)]
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime_secs: i64,
}

impl TokenManager {
    pub fn new(secret: &str, lifetime_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_secs,
        }
    }

    /// Sign a token for `identity`, valid for the configured lifetime
    pub fn issue(&self, identity: &Identity) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = TimeDelta::try_seconds(self.lifetime_secs)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or(AuthError::Lifetime(self.lifetime_secs))?;

        let claims = Claims {
            identity: identity.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AuthError::Signing)
    }

    /// Check the signature and expiry of `token` and return its claims
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims.identity)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken(e),
            })
    }
}

/// Hash a password for storage
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(AuthError::Hashing)?;

    Ok(hash.to_string())
}

/// Verify a password against its stored hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
