//! Error types for item request handling.

use crate::id::InvalidId;
use crate::store::StoreError;

use super::input::FieldKind;

/// Message sent to clients for every server-side failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Error type for handler operations.
///
/// `Display` carries internal detail for logs. Clients only ever see
/// [`HandlerError::public_message`].
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Path identifier is not 24 lowercase hex characters.
    #[error("invalid item id: {0}")]
    InvalidId(#[from] InvalidId),
    /// Request body is empty or not JSON.
    #[error("request body is not valid JSON: {0}")]
    InvalidJson(String),
    /// Request body is JSON but not an object.
    #[error("request body is a JSON {0}, expected object")]
    NotAnObject(&'static str),
    /// A required field is absent or null.
    #[error("missing required field {0}")]
    MissingField(String),
    /// A required field has the wrong JSON type.
    #[error("field {field} must be a {expected}")]
    WrongFieldType { field: String, expected: FieldKind },
    /// The client tried to supply a store-assigned key.
    #[error("field {0} is assigned by the store")]
    ReservedField(String),
    /// No item with this identifier.
    #[error("item not found: {0}")]
    NotFound(String),
    /// Persistence failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    /// The task running the operation failed (panicked or was cancelled).
    #[error("worker failed: {0}")]
    Worker(String),
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        HandlerError::InvalidJson(err.to_string())
    }
}

impl HandlerError {
    /// Map this error to an HTTP status code.
    pub fn status_code(&self) -> u16 {
        match self {
            HandlerError::InvalidId(_)
            | HandlerError::InvalidJson(_)
            | HandlerError::NotAnObject(_)
            | HandlerError::MissingField(_)
            | HandlerError::WrongFieldType { .. }
            | HandlerError::ReservedField(_) => 400,
            HandlerError::NotFound(_) => 404,
            HandlerError::Store(_) | HandlerError::Worker(_) => 500,
        }
    }

    /// Whether this is a server-side failure.
    pub fn is_internal(&self) -> bool {
        self.status_code() >= 500
    }

    /// The message safe to return to the client.
    pub fn public_message(&self) -> String {
        match self {
            HandlerError::InvalidId(_) => "Invalid item id".to_string(),
            HandlerError::InvalidJson(_) => "Request body must be valid JSON".to_string(),
            HandlerError::NotAnObject(_) => "Request body must be a JSON object".to_string(),
            HandlerError::MissingField(field) => format!("Missing required field: {field}"),
            HandlerError::WrongFieldType { field, expected } => {
                format!("Field {field} must be a {expected}")
            }
            HandlerError::ReservedField(field) => format!("Field {field} is assigned by the store"),
            HandlerError::NotFound(_) => "Item not found".to_string(),
            HandlerError::Store(_) | HandlerError::Worker(_) => INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }
}
