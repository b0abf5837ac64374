use serde_json::Value as Json;

use crate::{
    errors::{ConfigError, ErrorKind, Result},
    value::{Dict, Value},
};

/// Loader for boolean keys with a default.
#[derive(Debug)]
pub struct Flag {
    key: &'static str,
    doc: &'static str,
    default: bool,
}

impl Flag {
    pub fn new(key: &'static str, doc: &'static str, default: bool) -> Self {
        Self { key, doc, default }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn doc(&self) -> &'static str {
        self.doc
    }

    pub fn default_value(&self) -> bool {
        self.default
    }

    pub fn deserialize(&self, dict: &mut Dict) -> Result<Value> {
        match dict.shift_remove(self.key) {
            None => Ok(Value::Bool(self.default)),
            Some(Json::Bool(b)) => Ok(Value::Bool(b)),
            Some(other) => Err(ConfigError::type_mismatch(self.key, "a boolean", &other)),
        }
    }

    pub fn serialize(&self, dict: &mut Dict, value: &Value) {
        if let Some(b) = value.as_bool() {
            dict.insert(self.key.to_string(), Json::Bool(b));
        }
    }

    pub fn validate(&self, value: &Value) -> Result<()> {
        match value {
            Value::Bool(_) => Ok(()),
            _ => Err(ConfigError::new(ErrorKind::InvalidValue {
                reason: "expected a boolean".to_string(),
            })),
        }
    }

    pub fn markdown(&self) -> String {
        format!(
            "{}\n\nThis key is optional. If specified, it must be set to `true` or `false`. \
             The default is `{}`.",
            self.doc, self.default
        )
    }
}
