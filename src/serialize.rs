//! Wire form of stored documents.
//!
//! Every document leaves the service through [`serialize`]: `id` first as a
//! plain hex string, followed by the stored fields in stored order.

use serde_json::{Map, Value};

use crate::store::Document;

/// Key carrying the identifier in the wire form.
pub const ID_KEY: &str = "id";

/// Key the store uses natively for its identifier. Never emitted on the wire.
pub const NATIVE_ID_KEY: &str = "_id";

/// Convert a stored document into its JSON wire object.
pub fn serialize(doc: &Document) -> Value {
    let mut out = Map::with_capacity(doc.fields.len() + 1);
    out.insert(ID_KEY.to_string(), Value::String(doc.id.to_hex()));
    for (key, value) in &doc.fields {
        if key == ID_KEY || key == NATIVE_ID_KEY {
            continue;
        }
        out.insert(key.clone(), value.clone());
    }
    Value::Object(out)
}

/// Serialize a batch, preserving order.
pub fn serialize_all(docs: &[Document]) -> Vec<Value> {
    docs.iter().map(serialize).collect()
}
