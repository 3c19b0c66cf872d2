//! Persisted records of the rental domain
//!
//! Every record serializes its identifier under `_id` and uses camelCase field
//! names. Movies and rentals embed value snapshots of the records they refer to,
//! so later edits to a genre, customer or movie never rewrite history.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

/// Named document collections in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Genres,
    Customers,
    Movies,
    Rentals,
    Users,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Genres => "genres",
            Collection::Customers => "customers",
            Collection::Movies => "movies",
            Collection::Rentals => "rentals",
            Collection::Users => "users",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record stored as a JSON document in one collection
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection holding records of this type
    const COLLECTION: Collection;

    /// Human readable singular name, used in not-found messages
    const KIND: &'static str;

    fn id(&self) -> Uuid;

    /// Listing order
    fn compare(&self, other: &Self) -> Ordering;
}

/// Movie genre, also embedded by value into movies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
}

impl Genre {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
        }
    }
}

impl Document for Genre {
    const COLLECTION: Collection = Collection::Genres;
    const KIND: &'static str = "genre";

    fn id(&self) -> Uuid {
        self.id
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub is_gold: bool,
}

impl Customer {
    pub fn new(name: String, phone: String, is_gold: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            phone,
            is_gold,
        }
    }
}

impl Document for Customer {
    const COLLECTION: Collection = Collection::Customers;
    const KIND: &'static str = "customer";

    fn id(&self) -> Uuid {
        self.id
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

/// Movie title with its rentable stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,

    /// Genre as it was when the movie was last written
    pub genre: Genre,

    /// Copies available for rental; never negative
    pub number_in_stock: u8,

    pub daily_rental_rate: f64,
}

impl Movie {
    /// JSON field holding the stock counter, decremented in place by the stores
    pub const STOCK_FIELD: &'static str = "numberInStock";

    pub fn new(name: String, genre: Genre, number_in_stock: u8, daily_rental_rate: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            genre,
            number_in_stock,
            daily_rental_rate,
        }
    }

    pub fn in_stock(&self) -> bool {
        self.number_in_stock > 0
    }
}

impl Document for Movie {
    const COLLECTION: Collection = Collection::Movies;
    const KIND: &'static str = "movie";

    fn id(&self) -> Uuid {
        self.id
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

/// Customer fields captured when a rental is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSnapshot {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub phone: String,
}

impl From<&Customer> for CustomerSnapshot {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id,
            name: customer.name.clone(),
            phone: customer.phone.clone(),
        }
    }
}

/// Movie fields captured when a rental is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieSnapshot {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub daily_rental_rate: f64,
}

impl From<&Movie> for MovieSnapshot {
    fn from(movie: &Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.name.clone(),
            daily_rental_rate: movie.daily_rental_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rental {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub customer: CustomerSnapshot,
    pub movie: MovieSnapshot,
    pub date_out: DateTime<Utc>,

    /// Not populated by any operation yet
    pub date_returned: Option<DateTime<Utc>>,
}

impl Rental {
    /// Start a rental of `movie` by `customer`, dated now
    pub fn new(customer: &Customer, movie: &Movie) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer: customer.into(),
            movie: movie.into(),
            date_out: Utc::now(),
            date_returned: None,
        }
    }
}

impl Document for Rental {
    const COLLECTION: Collection = Collection::Rentals;
    const KIND: &'static str = "rental";

    fn id(&self) -> Uuid {
        self.id
    }

    /// Most recent rentals first
    fn compare(&self, other: &Self) -> Ordering {
        other.date_out.cmp(&self.date_out)
    }
}

/// Registered account. `password` holds a PHC-format hash, never the plain text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

impl User {
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password: password_hash,
            is_admin: false,
        }
    }
}

impl Document for User {
    const COLLECTION: Collection = Collection::Users;
    const KIND: &'static str = "user";

    fn id(&self) -> Uuid {
        self.id
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

/// User fields safe to return to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
        }
    }
}
