//! Document storage for the rental API
//!
//! Records are kept as JSON documents grouped by [`Collection`]. A
//! [`DocumentStore`] backend only moves raw documents around; [`Repository`]
//! layers typed access, listing order and the user email index on top of it.

mod memory;
mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use vidly_common::{Collection, Document, Rental, User};

/// Outcome of the atomic rental commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RentalCommit {
    /// Rental stored and movie stock decremented
    Committed,
    /// Movie stock was already zero; nothing written
    OutOfStock,
    /// Movie no longer exists; nothing written
    MovieMissing,
}

/// Outcome of writing a user record guarded by the unique email index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserWrite {
    Saved,
    EmailTaken,
    Missing,
}

/// Raw document backend
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Value>>;

    async fn list(&self, collection: Collection) -> Result<Vec<Value>>;

    async fn insert(&self, collection: Collection, id: Uuid, doc: Value) -> Result<()>;

    /// Overwrite an existing document. Returns `Ok(false)` if it does not exist.
    async fn replace(&self, collection: Collection, id: Uuid, doc: Value) -> Result<bool>;

    /// Delete a document, returning what was stored
    async fn remove(&self, collection: Collection, id: Uuid) -> Result<Option<Value>>;

    async fn user_id_by_email(&self, email: &str) -> Result<Option<Uuid>>;

    /// Reserve `email` for `user_id`. Returns `Ok(false)` if another user holds it.
    async fn claim_email(&self, email: &str, user_id: Uuid) -> Result<bool>;

    async fn release_email(&self, email: &str) -> Result<()>;

    /// Decrement the movie's stock if it is positive and store the rental, as one
    /// atomic step. Either both writes happen or neither does.
    async fn commit_rental(&self, movie_id: Uuid, rental_id: Uuid, rental: Value) -> Result<RentalCommit>;

    async fn health_check(&self) -> Result<()>;
}

/// Typed access to the document store
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn DocumentStore>,
}

impl Repository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn find<T: Document>(&self, id: Uuid) -> Result<Option<T>> {
        match self.store.get(T::COLLECTION, id).await? {
            Some(doc) => Ok(Some(decode(doc, T::COLLECTION)?)),
            None => Ok(None),
        }
    }

    /// Every record of the collection, in the type's listing order
    pub async fn all<T: Document>(&self) -> Result<Vec<T>> {
        let mut records = self
            .store
            .list(T::COLLECTION)
            .await?
            .into_iter()
            .map(|doc| decode::<T>(doc, T::COLLECTION))
            .collect::<Result<Vec<_>>>()?;

        records.sort_by(|a, b| a.compare(b));
        Ok(records)
    }

    pub async fn insert<T: Document>(&self, record: &T) -> Result<()> {
        let doc = encode(record)?;
        self.store.insert(T::COLLECTION, record.id(), doc).await?;

        debug!("Inserted {} {}", T::KIND, record.id());
        Ok(())
    }

    /// Returns `Ok(false)` if the record does not exist
    pub async fn replace<T: Document>(&self, record: &T) -> Result<bool> {
        let doc = encode(record)?;
        self.store.replace(T::COLLECTION, record.id(), doc).await
    }

    pub async fn remove<T: Document>(&self, id: Uuid) -> Result<Option<T>> {
        match self.store.remove(T::COLLECTION, id).await? {
            Some(doc) => Ok(Some(decode(doc, T::COLLECTION)?)),
            None => Ok(None),
        }
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.store.user_id_by_email(email).await? {
            Some(id) => self.find::<User>(id).await,
            None => Ok(None),
        }
    }

    /// Store a new user, refusing an email that is already registered
    pub async fn register_user(&self, user: &User) -> Result<UserWrite> {
        if !self.store.claim_email(&user.email, user.id).await? {
            debug!("Email already registered: {}", user.email);
            return Ok(UserWrite::EmailTaken);
        }

        if let Err(e) = self.insert(user).await {
            self.release_claim(&user.email).await;
            return Err(e);
        }

        info!("Registered user {}", user.id);
        Ok(UserWrite::Saved)
    }

    /// Overwrite a user, moving the email index entry when the address changes
    pub async fn update_user(&self, user: &User, previous_email: &str) -> Result<UserWrite> {
        let email_changed = user.email != previous_email;

        if email_changed && !self.store.claim_email(&user.email, user.id).await? {
            return Ok(UserWrite::EmailTaken);
        }

        let replaced = match self.replace(user).await {
            Ok(replaced) => replaced,
            Err(e) => {
                if email_changed {
                    self.release_claim(&user.email).await;
                }
                return Err(e);
            }
        };

        if !replaced {
            if email_changed {
                self.store.release_email(&user.email).await?;
            }
            return Ok(UserWrite::Missing);
        }

        if email_changed {
            self.store.release_email(previous_email).await?;
        }

        Ok(UserWrite::Saved)
    }

    /// Drop an email claim after a failed write, keeping the write's error as the one reported
    async fn release_claim(&self, email: &str) {
        if let Err(e) = self.store.release_email(email).await {
            warn!("Failed to release email claim for {}: {:#}", email, e);
        }
    }

    pub async fn remove_user(&self, id: Uuid) -> Result<Option<User>> {
        let removed = self.remove::<User>(id).await?;

        if let Some(user) = &removed {
            self.store.release_email(&user.email).await?;
        }

        Ok(removed)
    }

    /// Persist `rental` while taking one copy of its movie out of stock
    pub async fn commit_rental(&self, rental: &Rental) -> Result<RentalCommit> {
        let doc = encode(rental)?;
        self.store.commit_rental(rental.movie.id, rental.id, doc).await
    }

    pub async fn health_check(&self) -> Result<()> {
        self.store.health_check().await
    }
}

fn encode<T: Document>(record: &T) -> Result<Value> {
    serde_json::to_value(record).with_context(|| format!("Failed to serialize {}", T::KIND))
}

fn decode<T: Document>(doc: Value, collection: Collection) -> Result<T> {
    serde_json::from_value(doc)
        .with_context(|| format!("Failed to deserialize document from {}", collection))
}
