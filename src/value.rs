//! Values produced by loaders, and the dictionary type they are loaded from.

use serde_json::Value as Json;

use crate::{bitrange::BitRange, schema::Config};

/// A decoded configuration mapping. Keys are hyphen-separated words.
pub type Dict = serde_json::Map<String, Json>;

/// A value produced by a loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Explicit absence: a `null` choice or a missing optional object.
    None,
    Bool(bool),
    Int(i64),
    Str(String),
    BitRange(BitRange),
    /// An embedded object.
    Config(Box<Config>),
    /// The selected variant of a tagged union and its configuration.
    Select { variant: String, config: Box<Config> },
}

impl Value {
    /// Converts a scalar JSON value. Returns `None` for mappings, lists and
    /// numbers that are not representable as `i64`.
    pub fn from_json_scalar(json: &Json) -> Option<Value> {
        match json {
            Json::Null => Some(Value::None),
            Json::Bool(b) => Some(Value::Bool(*b)),
            Json::Number(n) => n.as_i64().map(Value::Int),
            Json::String(s) => Some(Value::Str(s.clone())),
            Json::Array(_) | Json::Object(_) => None,
        }
    }

    /// Inverse of [Value::from_json_scalar].
    pub fn to_json_scalar(&self) -> Option<Json> {
        match self {
            Value::None => Some(Json::Null),
            Value::Bool(b) => Some(Json::Bool(*b)),
            Value::Int(i) => Some(Json::from(*i)),
            Value::Str(s) => Some(Json::String(s.clone())),
            Value::BitRange(_) | Value::Config(_) | Value::Select { .. } => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bitrange(&self) -> Option<&BitRange> {
        match self {
            Value::BitRange(b) => Some(b),
            _ => None,
        }
    }

    /// The embedded object, or the configuration of the selected variant.
    pub fn as_config(&self) -> Option<&Config> {
        match self {
            Value::Config(c) => Some(c),
            Value::Select { config, .. } => Some(config),
            _ => None,
        }
    }

    /// Name of the selected variant for tagged-union values.
    pub fn variant(&self) -> Option<&str> {
        match self {
            Value::Select { variant, .. } => Some(variant),
            _ => None,
        }
    }
}

/// Short name of the kind of a JSON value, for error messages.
pub fn kind_name(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(n) if n.is_i64() => "an integer",
        Json::Number(n) if n.is_u64() => "an integer out of range",
        Json::Number(_) => "a float",
        Json::String(_) => "a string",
        Json::Array(_) => "a list",
        Json::Object(_) => "a dictionary",
    }
}
