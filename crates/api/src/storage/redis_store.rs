//! Redis storage backend
//!
//! Data model:
//! - {collection}:{id} → JSON document
//! - {collection}:all → Set of ids in the collection
//! - users:email:{email} → id of the user registered with that address

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;
use vidly_common::{Collection, Movie};

use super::{DocumentStore, RentalCommit};

/// Conditional stock decrement plus rental insert, run atomically by Redis.
///
/// The movie document is edited in place: only the stock counter's digits are
/// rewritten, every other byte is kept as stored.
///
/// KEYS: movie document, rental document, rentals index.
/// ARGV: rental JSON, rental id, stock field name.
/// Returns 1 when committed, 0 when out of stock, -1 when the movie is missing.
const COMMIT_RENTAL_SCRIPT: &str = r#"
local movie = redis.call('GET', KEYS[1])
if not movie then
    return -1
end
local field = '"' .. ARGV[3] .. '":'
local first, last = string.find(movie, field, 1, true)
if not first then
    return redis.error_reply('stock field missing from movie document')
end
local digits = string.match(movie, '^%d+', last + 1)
if not digits then
    return redis.error_reply('stock field is not a count')
end
local stock = tonumber(digits)
if stock <= 0 then
    return 0
end
local updated = string.sub(movie, 1, last) .. tostring(stock - 1) .. string.sub(movie, last + 1 + #digits)
redis.call('SET', KEYS[1], updated)
redis.call('SET', KEYS[2], ARGV[1])
redis.call('SADD', KEYS[3], ARGV[2])
return 1
"#;

/// Read and delete a document together with its index entry.
///
/// KEYS: document, collection index. ARGV: id.
/// Returns the removed JSON, or nil if there was none.
const REMOVE_SCRIPT: &str = r#"
local doc = redis.call('GET', KEYS[1])
if not doc then
    return false
end
redis.call('DEL', KEYS[1])
redis.call('SREM', KEYS[2], ARGV[1])
return doc
"#;

fn doc_key(collection: Collection, id: Uuid) -> String {
    format!("{}:{}", collection, id)
}

fn index_key(collection: Collection) -> String {
    format!("{}:all", collection)
}

fn email_key(email: &str) -> String {
    format!("users:email:{}", email)
}

fn parse_doc(data: &str, collection: Collection) -> Result<Value> {
    serde_json::from_str(data)
        .with_context(|| format!("Failed to deserialize document from {}", collection))
}

/// Storage backend for entity documents
pub struct RedisStore {
    conn: ConnectionManager,
    commit_script: Script,
    remove_script: Script,
}

impl RedisStore {
    /// Create a new storage instance
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).context("Failed to create Redis client")?;

        let conn = ConnectionManager::new(client)
            .await
            .context("Failed to connect to Redis")?;

        info!("Connected to Redis at {}", redis_url);

        Ok(Self {
            conn,
            commit_script: Script::new(COMMIT_RENTAL_SCRIPT),
            remove_script: Script::new(REMOVE_SCRIPT),
        })
    }
}

#[async_trait]
impl DocumentStore for RedisStore {
    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Value>> {
        let mut conn = self.conn.clone();
        let json: Option<String> = conn.get(doc_key(collection, id)).await?;

        json.map(|data| parse_doc(&data, collection)).transpose()
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Value>> {
        let mut conn = self.conn.clone();
        let ids: Vec<String> = conn.smembers(index_key(collection)).await?;

        let mut docs = Vec::with_capacity(ids.len());
        for id in ids {
            let json: Option<String> = conn.get(format!("{}:{}", collection, id)).await?;
            match json {
                Some(data) => docs.push(parse_doc(&data, collection)?),
                None => warn!("Index entry without document: {}:{}", collection, id),
            }
        }

        Ok(docs)
    }

    async fn insert(&self, collection: Collection, id: Uuid, doc: Value) -> Result<()> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(&doc).context("Failed to serialize document")?;

        let _: () = redis::pipe()
            .atomic()
            .set(doc_key(collection, id), json)
            .ignore()
            .sadd(index_key(collection), id.to_string())
            .ignore()
            .query_async(&mut conn)
            .await?;

        debug!("Stored {}:{}", collection, id);
        Ok(())
    }

    async fn replace(&self, collection: Collection, id: Uuid, doc: Value) -> Result<bool> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(&doc).context("Failed to serialize document")?;

        // SET XX only writes when the key already exists
        let reply: Option<String> = redis::cmd("SET")
            .arg(doc_key(collection, id))
            .arg(json)
            .arg("XX")
            .query_async(&mut conn)
            .await?;

        Ok(reply.is_some())
    }

    async fn remove(&self, collection: Collection, id: Uuid) -> Result<Option<Value>> {
        let mut conn = self.conn.clone();

        let json: Option<String> = self
            .remove_script
            .key(doc_key(collection, id))
            .key(index_key(collection))
            .arg(id.to_string())
            .invoke_async(&mut conn)
            .await
            .context("Remove script failed")?;

        let Some(data) = json else {
            return Ok(None);
        };

        info!("Deleted {}:{}", collection, id);
        parse_doc(&data, collection).map(Some)
    }

    async fn user_id_by_email(&self, email: &str) -> Result<Option<Uuid>> {
        let mut conn = self.conn.clone();
        let id: Option<String> = conn.get(email_key(email)).await?;

        id.map(|id| Uuid::parse_str(&id).context("Corrupt email index entry"))
            .transpose()
    }

    async fn claim_email(&self, email: &str, user_id: Uuid) -> Result<bool> {
        let mut conn = self.conn.clone();

        // SET NX - only the first claimant gets the address
        let claimed: bool = conn.set_nx(email_key(email), user_id.to_string()).await?;
        Ok(claimed)
    }

    async fn release_email(&self, email: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(email_key(email)).await?;
        Ok(())
    }

    async fn commit_rental(&self, movie_id: Uuid, rental_id: Uuid, rental: Value) -> Result<RentalCommit> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(&rental).context("Failed to serialize rental")?;

        let outcome: i64 = self
            .commit_script
            .key(doc_key(Collection::Movies, movie_id))
            .key(doc_key(Collection::Rentals, rental_id))
            .key(index_key(Collection::Rentals))
            .arg(json)
            .arg(rental_id.to_string())
            .arg(Movie::STOCK_FIELD)
            .invoke_async(&mut conn)
            .await
            .context("Rental commit script failed")?;

        match outcome {
            1 => Ok(RentalCommit::Committed),
            0 => Ok(RentalCommit::OutOfStock),
            -1 => Ok(RentalCommit::MovieMissing),
            other => anyhow::bail!("Unexpected rental commit result: {}", other),
        }
    }

    async fn health_check(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Repository;
    use std::sync::Arc;
    use vidly_common::{Customer, Genre, Rental};

    async fn get_test_repository() -> Repository {
        let store = RedisStore::new("redis://127.0.0.1:6379/15")
            .await
            .expect("Failed to connect to test Redis");
        Repository::new(Arc::new(store))
    }

    #[test]
    fn test_key_layout() {
        let id = Uuid::nil();
        assert_eq!(
            doc_key(Collection::Movies, id),
            "movies:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(index_key(Collection::Rentals), "rentals:all");
        assert_eq!(email_key("a@b.io"), "users:email:a@b.io");
    }

    #[test]
    fn test_stored_movie_has_compact_stock_field() {
        let movie = Movie::new("Heat".to_string(), Genre::new("Crime".to_string()), 4, 2.5);
        let json = serde_json::to_string(&serde_json::to_value(&movie).unwrap()).unwrap();

        let field = format!("\"{}\":4", Movie::STOCK_FIELD);
        assert_eq!(json.matches(&field).count(), 1);
    }

    #[tokio::test]
    #[ignore] // Requires Redis to be running
    async fn test_store_and_remove_genre() {
        let repo = get_test_repository().await;
        let genre = Genre::new("Redis Genre".to_string());

        repo.insert(&genre).await.unwrap();
        let found = repo.find::<Genre>(genre.id).await.unwrap();
        assert_eq!(found, Some(genre.clone()));

        let removed = repo.remove::<Genre>(genre.id).await.unwrap();
        assert_eq!(removed, Some(genre.clone()));
        assert!(repo.find::<Genre>(genre.id).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore] // Requires Redis to be running
    async fn test_commit_script_decrements_and_stops_at_zero() {
        let repo = get_test_repository().await;
        let customer = Customer::new("Ada".to_string(), "555-123-4567".to_string(), false);
        let movie = Movie::new("Heat".to_string(), Genre::new("Crime".to_string()), 1, 2.5);
        repo.insert(&movie).await.unwrap();

        let rental = Rental::new(&customer, &movie);
        assert_eq!(repo.commit_rental(&rental).await.unwrap(), RentalCommit::Committed);

        let stored = repo.find::<Movie>(movie.id).await.unwrap().unwrap();
        assert_eq!(stored.number_in_stock, 0);
        assert_eq!(stored.daily_rental_rate, 2.5);

        let again = Rental::new(&customer, &movie);
        assert_eq!(repo.commit_rental(&again).await.unwrap(), RentalCommit::OutOfStock);

        // Clean up
        repo.remove::<Rental>(rental.id).await.unwrap();
        repo.remove::<Movie>(movie.id).await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires Redis to be running
    async fn test_commit_script_keeps_other_movie_fields_exact() {
        let repo = get_test_repository().await;
        let customer = Customer::new("Ada".to_string(), "555-123-4567".to_string(), false);
        let movie = Movie::new(
            "Thirds".to_string(),
            Genre::new("Maths".to_string()),
            10,
            3.3333333333333335,
        );
        repo.insert(&movie).await.unwrap();

        let rental = Rental::new(&customer, &movie);
        assert_eq!(repo.commit_rental(&rental).await.unwrap(), RentalCommit::Committed);

        let stored = repo.find::<Movie>(movie.id).await.unwrap().unwrap();
        assert_eq!(stored.number_in_stock, 9);
        assert_eq!(stored.daily_rental_rate, 3.3333333333333335);
        assert_eq!(stored.genre, movie.genre);
        assert_eq!(stored.name, movie.name);

        // Clean up
        repo.remove::<Rental>(rental.id).await.unwrap();
        repo.remove::<Movie>(movie.id).await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires Redis to be running
    async fn test_concurrent_removes_return_record_once() {
        let repo = get_test_repository().await;
        let genre = Genre::new("Removal".to_string());
        repo.insert(&genre).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repo = repo.clone();
                let id = genre.id;
                tokio::spawn(async move { repo.remove::<Genre>(id).await.unwrap() })
            })
            .collect();

        let mut removed = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                removed += 1;
            }
        }

        assert_eq!(removed, 1);
        assert!(repo.find::<Genre>(genre.id).await.unwrap().is_none());
    }
}
