//! InMemoryDatabase - insertion-ordered, process-local document store.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::{Collection, Document, FindOptions, StoreError};
use crate::id::ObjectId;

type Records = IndexMap<ObjectId, Map<String, Value>>;

/// In-memory database holding named collections.
///
/// Clone-friendly via Arc; clones see the same collections.
#[derive(Clone)]
pub struct InMemoryDatabase {
    name: Arc<str>,
    collections: Arc<RwLock<HashMap<String, Arc<RwLock<Records>>>>>,
}

impl InMemoryDatabase {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            collections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get (or lazily create) a collection handle.
    pub fn collection(&self, name: &str) -> InMemoryCollection {
        let records = {
            let mut collections = match self.collections.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            collections
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(RwLock::new(IndexMap::new())))
                .clone()
        };
        InMemoryCollection {
            name: Arc::from(name),
            records,
        }
    }
}

/// Handle to one collection of an [`InMemoryDatabase`].
///
/// Documents iterate in insertion order. Deletes keep the order of the
/// remaining documents.
#[derive(Clone)]
pub struct InMemoryCollection {
    name: Arc<str>,
    records: Arc<RwLock<Records>>,
}

impl InMemoryCollection {
    /// A standalone collection not attached to any database.
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            records: Arc::new(RwLock::new(IndexMap::new())),
        }
    }

    /// Number of stored documents.
    pub fn len(&self) -> Result<usize, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::LockPoisoned("len"))?;
        Ok(records.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl Collection for InMemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn find(&self, options: FindOptions) -> Result<Vec<Document>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::LockPoisoned("find"))?;

        let limit = options.limit.unwrap_or(usize::MAX);
        Ok(records
            .iter()
            .skip(options.skip)
            .take(limit)
            .map(|(id, fields)| Document {
                id: *id,
                fields: fields.clone(),
            })
            .collect())
    }

    fn find_one(&self, id: &ObjectId) -> Result<Option<Document>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::LockPoisoned("find_one"))?;

        Ok(records.get(id).map(|fields| Document {
            id: *id,
            fields: fields.clone(),
        }))
    }

    fn insert_one(&self, fields: Map<String, Value>) -> Result<ObjectId, StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::LockPoisoned("insert_one"))?;

        let mut id = ObjectId::new();
        while records.contains_key(&id) {
            id = ObjectId::new();
        }
        records.insert(id, fields);
        Ok(id)
    }

    fn find_one_and_delete(&self, id: &ObjectId) -> Result<Option<Document>, StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::LockPoisoned("find_one_and_delete"))?;

        Ok(records.shift_remove(id).map(|fields| Document { id: *id, fields }))
    }

    fn ping(&self) -> Result<(), StoreError> {
        self.records
            .read()
            .map(|_| ())
            .map_err(|_| StoreError::LockPoisoned("ping"))
    }
}
