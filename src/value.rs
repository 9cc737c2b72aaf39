//! JSON text codec for stored values
//!
//! Every value is kept in Redis as one UTF-8 JSON document under a plain string
//! key. The store never sees any structure.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::error::{ClientError, ClientResult};

/// The logical payload stored under a key
pub type StoredValue = Value;

/// Top-level JSON shape of a value, used in error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Sequence,
    Mapping,
    String,
    Number,
    Bool,
    Null,
}

impl Shape {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Array(_) => Shape::Sequence,
            Value::Object(_) => Shape::Mapping,
            Value::String(_) => Shape::String,
            Value::Number(_) => Shape::Number,
            Value::Bool(_) => Shape::Bool,
            Value::Null => Shape::Null,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Shape::Sequence => "sequence",
            Shape::Mapping => "mapping",
            Shape::String => "string",
            Shape::Number => "number",
            Shape::Bool => "bool",
            Shape::Null => "null",
        };
        f.write_str(name)
    }
}

/// Value returned for keys that hold nothing
pub fn empty_sequence() -> Value {
    Value::Array(Vec::new())
}

/// Serializes any `Serialize` value to JSON text
///
/// Types without a native JSON form (dates, UUIDs, ...) go through their serde
/// representation, which for most of them is a string.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> ClientResult<String> {
    serde_json::to_string(value)
        .map_err(|e| ClientError::serialization(format!("JSON encoding failed: {}", e)))
}

/// Parses stored JSON text back into a [`Value`]
pub fn decode(text: &str) -> ClientResult<Value> {
    serde_json::from_str(text)
        .map_err(|e| ClientError::serialization(format!("JSON decoding failed: {}", e)))
}

/// Decodes a raw `GET` reply, treating an absent or empty string as `None`
pub fn decode_optional(raw: Option<String>) -> ClientResult<Option<Value>> {
    match raw {
        Some(text) if !text.is_empty() => decode(&text).map(Some),
        _ => Ok(None),
    }
}
