//! handler — the item request handler.
//!
//! `ItemHandler<C>` turns raw request input (path ids, query parameters,
//! body bytes) into store calls on an injected [`Collection`] and turns the
//! results back into a status code plus JSON body. It is transport
//! agnostic: the HTTP layer only extracts raw input and writes the [`Reply`].
//!
//! ## Example
//!
//! ```ignore
//! use cart_items::handler::ItemHandler;
//! use cart_items::store::InMemoryCollection;
//!
//! let handler = ItemHandler::new(InMemoryCollection::new("items"));
//!
//! let created = handler.create(br#"{"name":"bat","price":10}"#)?;
//! assert_eq!(created.status, 201);
//!
//! let id = created.body["item"]["id"].as_str().unwrap();
//! let fetched = handler.get(id)?;
//! let removed = handler.delete(id)?;
//! ```

mod error;
mod input;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::id;
use crate::serialize::{serialize, serialize_all};
use crate::store::{Collection, StoreError};

pub use error::{HandlerError, INTERNAL_ERROR_MESSAGE};
pub use input::{parse_body, FieldKind, ItemSchema, ListQuery, RequiredField};

/// An operation outcome ready for the wire: HTTP-style status plus JSON body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn created(body: Value) -> Self {
        Self { status: 201, body }
    }

    /// Build the `{ "message": ... }` reply for a failed operation.
    pub fn from_error(err: &HandlerError) -> Self {
        Self {
            status: err.status_code(),
            body: json!({ "message": err.public_message() }),
        }
    }
}

impl From<HandlerError> for Reply {
    fn from(err: HandlerError) -> Self {
        Self::from_error(&err)
    }
}

/// Handles list/get/create/delete against one collection.
///
/// Holds no state besides the collection handle and the schema, so one
/// instance can serve any number of concurrent requests.
pub struct ItemHandler<C> {
    items: C,
    schema: ItemSchema,
}

impl<C: Collection> ItemHandler<C> {
    /// Create a handler over the given collection with the default schema.
    pub fn new(items: C) -> Self {
        Self {
            items,
            schema: ItemSchema::default(),
        }
    }

    /// Replace the required-field schema (builder style).
    pub fn with_schema(mut self, schema: ItemSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn schema(&self) -> &ItemSchema {
        &self.schema
    }

    /// Get a reference to the collection.
    pub fn collection(&self) -> &C {
        &self.items
    }

    /// `GET /items` — `{ count, items }` in store order.
    pub fn list(&self, query: &ListQuery) -> Result<Reply, HandlerError> {
        let docs = self.items.find(query.find_options())?;
        let items = serialize_all(&docs);
        Ok(Reply::ok(json!({ "count": items.len(), "items": items })))
    }

    /// `GET /items/:id` — `{ message, item }`.
    pub fn get(&self, raw_id: &str) -> Result<Reply, HandlerError> {
        let id = id::validate(raw_id)?;
        let doc = self
            .items
            .find_one(&id)?
            .ok_or_else(|| HandlerError::NotFound(id.to_hex()))?;
        Ok(Reply::ok(json!({
            "message": "Item retrieved",
            "item": serialize(&doc),
        })))
    }

    /// `POST /items` — insert, re-read, reply with what the store holds.
    pub fn create(&self, body: &[u8]) -> Result<Reply, HandlerError> {
        let fields = parse_body(body)?;
        self.schema.check(&fields)?;

        let id = self.items.insert_one(fields)?;
        let doc = self.items.find_one(&id)?.ok_or_else(|| {
            StoreError::Unavailable(format!(
                "inserted document {id} missing from {}",
                self.items.name()
            ))
        })?;
        tracing::debug!(collection = self.items.name(), %id, "item created");

        Ok(Reply::created(json!({
            "message": "Item created",
            "item": serialize(&doc),
        })))
    }

    /// `DELETE /items/:id` — atomic find-and-delete.
    pub fn delete(&self, raw_id: &str) -> Result<Reply, HandlerError> {
        let id = id::validate(raw_id)?;
        self.items
            .find_one_and_delete(&id)?
            .ok_or_else(|| HandlerError::NotFound(id.to_hex()))?;
        tracing::debug!(collection = self.items.name(), %id, "item deleted");

        Ok(Reply::ok(json!({ "message": "Item deleted" })))
    }

    /// `GET /health` — pings the store.
    pub fn health(&self) -> Result<Reply, HandlerError> {
        self.items.ping()?;
        Ok(Reply::ok(json!({ "ok": true, "collection": self.items.name() })))
    }
}
