//! cart_items — an HTTP list/read/create/delete service over the `items`
//! document collection of a shopping cart.
//!
//! The crate is split the way requests flow through it:
//!
//! - [`id`] validates client identifiers into the store's [`ObjectId`].
//! - [`store`] is the persistence gateway: a [`Database`] opened from a
//!   connection string, handing out [`Collection`] handles.
//! - [`serialize`] turns stored documents into their JSON wire form.
//! - [`handler`] is the transport-agnostic [`ItemHandler`].
//! - [`http`] (feature `http`) exposes the handler through axum.
//! - [`config`] reads process settings from the environment.

pub mod config;
pub mod handler;
pub mod id;
pub mod serialize;
pub mod store;

#[cfg(feature = "http")]
pub mod http;

pub use config::{Config, ConfigError};
pub use handler::{FieldKind, HandlerError, ItemHandler, ItemSchema, ListQuery, Reply};
pub use id::{validate, InvalidId, ObjectId};
pub use serialize::serialize;
pub use store::{Collection, Database, Document, FindOptions, InMemoryCollection, StoreError};
