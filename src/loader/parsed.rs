use serde_json::Value as Json;

use crate::{
    context::LoadContext,
    errors::{ConfigError, ErrorKind, Result, ResultExt},
    value::{Dict, Value},
};

/// Converts the raw value of a [Parsed] key. Errors should not carry the key
/// itself; the loader prepends it.
pub type ParseFn = fn(&Json, &LoadContext<'_>) -> Result<Value>;

/// Inverse of a [ParseFn].
pub type FormatFn = fn(&Value) -> Json;

/// Loader for keys with a custom parse/format pair.
#[derive(Debug)]
pub struct Parsed {
    key: &'static str,
    doc: &'static str,
    parse: ParseFn,
    format: FormatFn,
    optional: bool,
}

impl Parsed {
    pub fn new(key: &'static str, doc: &'static str, parse: ParseFn, format: FormatFn) -> Self {
        Self {
            key,
            doc,
            parse,
            format,
            optional: false,
        }
    }

    /// Absent keys produce [Value::None] instead of an error.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn doc(&self) -> &'static str {
        self.doc
    }

    pub fn required(&self) -> bool {
        !self.optional
    }

    pub fn deserialize(&self, dict: &mut Dict, ctx: &LoadContext<'_>) -> Result<Value> {
        match dict.shift_remove(self.key) {
            None if self.optional => Ok(Value::None),
            None => Err(ConfigError::at(self.key, ErrorKind::MissingRequiredKey)),
            Some(json) => (self.parse)(&json, ctx).in_key(self.key),
        }
    }

    pub fn serialize(&self, dict: &mut Dict, value: &Value) {
        if !value.is_none() {
            dict.insert(self.key.to_string(), (self.format)(value));
        }
    }

    pub fn markdown(&self) -> String {
        if self.optional {
            format!("{}\n\nThis key is optional.", self.doc)
        } else {
            format!("{}\n\nThis key is required.", self.doc)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;
    use crate::context::ParseContext;

    fn parse_upper(json: &Json, _ctx: &LoadContext<'_>) -> Result<Value> {
        match json.as_str() {
            Some(s) => Ok(Value::Str(s.to_uppercase())),
            None => Err(ConfigError::new(ErrorKind::InvalidValue {
                reason: "not a string".to_string(),
            })),
        }
    }

    fn format_lower(value: &Value) -> Json {
        Json::String(value.as_str().unwrap_or_default().to_lowercase())
    }

    #[test]
    fn test_parse_and_format() {
        let loader = Parsed::new("name", "Name.", parse_upper, format_lower);
        let parse = ParseContext::default();
        let siblings = BTreeMap::new();
        let ctx = LoadContext::new(&parse, &siblings);

        let mut d = json!({"name": "ctrl"}).as_object().unwrap().clone();
        let value = loader.deserialize(&mut d, &ctx).unwrap();
        assert_eq!(value, Value::Str("CTRL".to_string()));

        loader.serialize(&mut d, &value);
        assert_eq!(d.get("name"), Some(&json!("ctrl")));
    }

    #[test]
    fn test_parse_error_gets_key() {
        let loader = Parsed::new("name", "Name.", parse_upper, format_lower);
        let parse = ParseContext::default();
        let siblings = BTreeMap::new();
        let ctx = LoadContext::new(&parse, &siblings);

        let mut d = json!({"name": 3}).as_object().unwrap().clone();
        let err = loader.deserialize(&mut d, &ctx).unwrap_err();
        assert_eq!(err.path(), ["name"]);
    }

    #[test]
    fn test_optional() {
        let parse = ParseContext::default();
        let siblings = BTreeMap::new();
        let ctx = LoadContext::new(&parse, &siblings);

        let required = Parsed::new("name", "Name.", parse_upper, format_lower);
        assert_eq!(
            required.deserialize(&mut Dict::new(), &ctx).unwrap_err().kind(),
            &ErrorKind::MissingRequiredKey
        );

        let optional = Parsed::new("name", "Name.", parse_upper, format_lower).optional();
        assert_eq!(optional.deserialize(&mut Dict::new(), &ctx).unwrap(), Value::None);
        let mut d = Dict::new();
        optional.serialize(&mut d, &Value::None);
        assert!(d.is_empty());
    }
}
