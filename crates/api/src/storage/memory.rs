//! In-process storage backend

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;
use vidly_common::{Collection, Movie};

use super::{DocumentStore, RentalCommit};

#[derive(Default)]
struct State {
    collections: HashMap<Collection, HashMap<Uuid, Value>>,
    emails: HashMap<String, Uuid>,
}

/// Storage backend keeping every document in memory behind one lock.
///
/// Each operation runs inside a single critical section, which makes the
/// rental commit atomic with respect to every other request.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Value>> {
        let state = self.state.lock().await;
        Ok(state
            .collections
            .get(&collection)
            .and_then(|docs| docs.get(&id))
            .cloned())
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Value>> {
        let state = self.state.lock().await;
        Ok(state
            .collections
            .get(&collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn insert(&self, collection: Collection, id: Uuid, doc: Value) -> Result<()> {
        let mut state = self.state.lock().await;
        state.collections.entry(collection).or_default().insert(id, doc);
        Ok(())
    }

    async fn replace(&self, collection: Collection, id: Uuid, doc: Value) -> Result<bool> {
        let mut state = self.state.lock().await;
        match state
            .collections
            .get_mut(&collection)
            .and_then(|docs| docs.get_mut(&id))
        {
            Some(existing) => {
                *existing = doc;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove(&self, collection: Collection, id: Uuid) -> Result<Option<Value>> {
        let mut state = self.state.lock().await;
        Ok(state
            .collections
            .get_mut(&collection)
            .and_then(|docs| docs.remove(&id)))
    }

    async fn user_id_by_email(&self, email: &str) -> Result<Option<Uuid>> {
        let state = self.state.lock().await;
        Ok(state.emails.get(email).copied())
    }

    async fn claim_email(&self, email: &str, user_id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().await;
        if state.emails.contains_key(email) {
            return Ok(false);
        }
        state.emails.insert(email.to_string(), user_id);
        Ok(true)
    }

    async fn release_email(&self, email: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.emails.remove(email);
        Ok(())
    }

    async fn commit_rental(&self, movie_id: Uuid, rental_id: Uuid, rental: Value) -> Result<RentalCommit> {
        let mut state = self.state.lock().await;

        let Some(movie) = state
            .collections
            .get_mut(&Collection::Movies)
            .and_then(|docs| docs.get_mut(&movie_id))
            .and_then(Value::as_object_mut)
        else {
            return Ok(RentalCommit::MovieMissing);
        };

        let stock = movie
            .get(Movie::STOCK_FIELD)
            .and_then(Value::as_u64)
            .unwrap_or(0);
        if stock == 0 {
            return Ok(RentalCommit::OutOfStock);
        }
        movie.insert(Movie::STOCK_FIELD.to_string(), Value::from(stock - 1));

        state
            .collections
            .entry(Collection::Rentals)
            .or_default()
            .insert(rental_id, rental);

        Ok(RentalCommit::Committed)
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
