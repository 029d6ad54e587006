//! Request input parsing: list pagination, create bodies and the
//! required-field schema they are checked against.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use super::error::HandlerError;
use crate::serialize::{ID_KEY, NATIVE_ID_KEY};
use crate::store::FindOptions;

/// JSON type a required field must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Any,
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl FieldKind {
    pub fn matches(self, value: &Value) -> bool {
        match self {
            FieldKind::Any => true,
            FieldKind::String => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Array => value.is_array(),
            FieldKind::Object => value.is_object(),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Any => "value",
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Array => "array",
            FieldKind::Object => "object",
        };
        f.write_str(name)
    }
}

impl FromStr for FieldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "any" => Ok(FieldKind::Any),
            "string" => Ok(FieldKind::String),
            "number" => Ok(FieldKind::Number),
            "boolean" | "bool" => Ok(FieldKind::Boolean),
            "array" => Ok(FieldKind::Array),
            "object" => Ok(FieldKind::Object),
            other => Err(format!("unknown field kind: {other}")),
        }
    }
}

/// A field every created item must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredField {
    pub name: String,
    pub kind: FieldKind,
}

impl RequiredField {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Required-field checks applied to create bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSchema {
    required: Vec<RequiredField>,
}

impl Default for ItemSchema {
    fn default() -> Self {
        Self {
            required: vec![RequiredField::new("name", FieldKind::String)],
        }
    }
}

impl ItemSchema {
    /// A schema with no required fields: any JSON object is accepted.
    pub fn open() -> Self {
        Self {
            required: Vec::new(),
        }
    }

    /// Add a required field (builder style).
    pub fn require(mut self, name: &str, kind: FieldKind) -> Self {
        self.required.push(RequiredField::new(name, kind));
        self
    }

    pub fn required(&self) -> &[RequiredField] {
        &self.required
    }

    /// Parse a comma separated `name[:kind]` list, e.g. `"name:string,price:number"`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut schema = Self::open();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, kind) = match entry.split_once(':') {
                Some((name, kind)) => (name.trim(), kind.parse::<FieldKind>()?),
                None => (entry, FieldKind::Any),
            };
            if name.is_empty() {
                return Err(format!("empty field name in {entry:?}"));
            }
            if name == ID_KEY || name == NATIVE_ID_KEY {
                return Err(format!("{name} is assigned by the store"));
            }
            schema = schema.require(name, kind);
        }
        Ok(schema)
    }

    /// Check presence and type of every required field, in declaration order.
    pub fn check(&self, fields: &Map<String, Value>) -> Result<(), HandlerError> {
        for field in &self.required {
            match fields.get(&field.name) {
                None | Some(Value::Null) => {
                    return Err(HandlerError::MissingField(field.name.clone()))
                }
                Some(value) if !field.kind.matches(value) => {
                    return Err(HandlerError::WrongFieldType {
                        field: field.name.clone(),
                        expected: field.kind,
                    })
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// Parse a create body: bytes → JSON object, rejecting store-assigned keys.
///
/// Required-field checks are separate (see [`ItemSchema::check`]).
pub fn parse_body(body: &[u8]) -> Result<Map<String, Value>, HandlerError> {
    let value: Value = serde_json::from_slice(body)?;
    let fields = match value {
        Value::Object(map) => map,
        Value::Null => return Err(HandlerError::NotAnObject("null")),
        Value::Bool(_) => return Err(HandlerError::NotAnObject("boolean")),
        Value::Number(_) => return Err(HandlerError::NotAnObject("number")),
        Value::String(_) => return Err(HandlerError::NotAnObject("string")),
        Value::Array(_) => return Err(HandlerError::NotAnObject("array")),
    };

    for key in [ID_KEY, NATIVE_ID_KEY] {
        if fields.contains_key(key) {
            return Err(HandlerError::ReservedField(key.to_string()));
        }
    }
    Ok(fields)
}

/// Offset pagination parameters for listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// `None` lists everything.
    pub limit: Option<usize>,
    pub skip: usize,
}

impl ListQuery {
    /// Build from raw query parameters.
    ///
    /// Malformed values (negative, non-numeric, overflowing) fall back to the
    /// defaults instead of failing the request. `limit=0` yields an empty page.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let limit = params
            .get("limit")
            .and_then(|raw| parse_non_negative(raw));
        let skip = params
            .get("skip")
            .and_then(|raw| parse_non_negative(raw))
            .unwrap_or(0);
        Self { limit, skip }
    }

    /// Build from a raw, still percent-encoded query string (`limit=5&skip=10`).
    ///
    /// Each parameter is decoded on its own: an undecodable value only loses
    /// that parameter, never its neighbours.
    pub fn from_query_string(raw: &str) -> Self {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw).unwrap_or_default();
        let params: HashMap<String, String> = pairs.into_iter().collect();
        Self::from_params(&params)
    }

    pub fn find_options(&self) -> FindOptions {
        let options = FindOptions::default().skip(self.skip);
        match self.limit {
            Some(limit) => options.limit(limit),
            None => options,
        }
    }
}

fn parse_non_negative(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok()
}
