//! Store - the persistence gateway over named document collections.
//!
//! A [`Database`] is opened from a connection string and hands out
//! [`Collection`] handles. Handles are cheap to clone and share the
//! underlying storage, so one connected database can back any number of
//! concurrent request handlers.
//!
//! ## Example
//!
//! ```ignore
//! use cart_items::store::{Collection, Database, FindOptions};
//!
//! let db = Database::connect("memory://cart")?;
//! let items = db.collection("items");
//!
//! let id = items.insert_one(serde_json::Map::new())?;
//! let doc = items.find_one(&id)?;
//! let page = items.find(FindOptions::default().skip(10).limit(5))?;
//! let removed = items.find_one_and_delete(&id)?;
//! ```

mod in_memory;

use serde_json::{Map, Value};

use crate::id::ObjectId;

pub use in_memory::{InMemoryCollection, InMemoryDatabase};

/// A stored record: the store-assigned identifier plus the client's fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: ObjectId,
    pub fields: Map<String, Value>,
}

/// Offset pagination for [`Collection::find`]. `skip` applies before `limit`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub skip: usize,
    /// `None` returns everything after `skip`.
    pub limit: Option<usize>,
}

impl FindOptions {
    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Error type for store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The connection string could not be parsed.
    #[error("invalid connection string: {0}")]
    InvalidConnectionString(String),
    /// The connection string names a backend this build does not provide.
    #[error("unsupported store scheme: {0}")]
    UnsupportedScheme(String),
    /// A writer panicked while holding the storage lock.
    #[error("store lock poisoned during {0}")]
    LockPoisoned(&'static str),
    /// The store could not serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Collection-level CRUD primitives over one named collection.
///
/// Every call is blocking from the caller's point of view. Implementations
/// generate identifiers on insert and never reuse them.
pub trait Collection: Send + Sync {
    /// The collection name (e.g. `"items"`).
    fn name(&self) -> &str;

    /// Documents in store iteration order, after `skip`, at most `limit`.
    fn find(&self, options: FindOptions) -> Result<Vec<Document>, StoreError>;

    /// Look up one document by identifier.
    fn find_one(&self, id: &ObjectId) -> Result<Option<Document>, StoreError>;

    /// Insert a new document and return the identifier the store assigned.
    fn insert_one(&self, fields: Map<String, Value>) -> Result<ObjectId, StoreError>;

    /// Atomically remove a document, returning it if it existed.
    fn find_one_and_delete(&self, id: &ObjectId) -> Result<Option<Document>, StoreError>;

    /// Round-trip to the store without touching any documents.
    fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// A connected database, opened from a connection string.
#[derive(Clone)]
pub enum Database {
    Memory(InMemoryDatabase),
}

impl Database {
    /// Open a database from a connection string.
    ///
    /// Supported: `memory://` and `memory://<name>`.
    pub fn connect(url: &str) -> Result<Self, StoreError> {
        let url = url.trim();
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| StoreError::InvalidConnectionString(url.to_string()))?;
        if scheme.is_empty() {
            return Err(StoreError::InvalidConnectionString(url.to_string()));
        }

        match scheme {
            "memory" => {
                let name = rest.trim_end_matches('/');
                if name.contains('/') {
                    return Err(StoreError::InvalidConnectionString(url.to_string()));
                }
                let name = if name.is_empty() { "default" } else { name };
                tracing::debug!(database = name, "opened in-memory database");
                Ok(Database::Memory(InMemoryDatabase::new(name)))
            }
            other => Err(StoreError::UnsupportedScheme(other.to_string())),
        }
    }

    /// The database name taken from the connection string.
    pub fn name(&self) -> &str {
        match self {
            Database::Memory(db) => db.name(),
        }
    }

    /// Get a handle to a named collection, creating it on first use.
    pub fn collection(&self, name: &str) -> InMemoryCollection {
        match self {
            Database::Memory(db) => db.collection(name),
        }
    }
}
