use serde_json::Value as Json;
use tracing::debug;

use super::{extract, prefixed};
use crate::{
    context::LoadContext,
    errors::{ConfigError, Result, ResultExt},
    schema::Schema,
    value::{Dict, Value},
};

/// Where the keys of an embedded object live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// In a dictionary under a key named after the loader.
    Subkey,
    /// At the current level, each key prefixed with `<prefix>-`.
    Prefixed(&'static str),
    /// At the current level, unprefixed.
    Inline,
}

impl Style {
    fn prefix(self) -> &'static str {
        match self {
            Style::Prefixed(prefix) => prefix,
            Style::Subkey | Style::Inline => "",
        }
    }
}

/// Loader for an embedded object described by another schema.
#[derive(Debug)]
pub struct SubConfig {
    key: &'static str,
    doc: &'static str,
    schema: &'static Schema,
    style: Style,
    optional: bool,
}

impl SubConfig {
    pub fn new(key: &'static str, doc: &'static str, schema: &'static Schema, style: Style) -> Self {
        Self {
            key,
            doc,
            schema,
            style,
            optional: false,
        }
    }

    /// The object may be omitted entirely, yielding [Value::None].
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

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn style(&self) -> Style {
        self.style
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn keys(&self) -> Vec<String> {
        match self.style {
            Style::Subkey => vec![self.key.to_string()],
            Style::Prefixed(prefix) => self
                .schema
                .keys()
                .iter()
                .map(|key| prefixed(prefix, key))
                .collect(),
            Style::Inline => self.schema.keys(),
        }
    }

    pub fn deserialize(&self, dict: &mut Dict, ctx: &LoadContext<'_>) -> Result<Value> {
        let config = match self.style {
            Style::Subkey => {
                let sub = match dict.shift_remove(self.key) {
                    None if self.optional => return Ok(Value::None),
                    None => Dict::new(),
                    Some(Json::Object(sub)) => sub,
                    Some(other) => {
                        return Err(ConfigError::type_mismatch(self.key, "a dictionary", &other));
                    }
                };
                self.schema
                    .from_dict(sub, ctx.parse_context())
                    .in_key(self.key)?
            }
            Style::Prefixed(_) | Style::Inline => {
                let prefix = self.style.prefix();
                let sub = extract(dict, self.schema, prefix);
                if sub.is_empty() && self.optional {
                    debug!(key = self.key, "optional embedded object absent");
                    return Ok(Value::None);
                }
                self.schema
                    .from_dict(sub, ctx.parse_context())
                    .in_prefix(prefix)?
            }
        };
        Ok(Value::Config(Box::new(config)))
    }

    pub fn serialize(&self, dict: &mut Dict, value: &Value) {
        let Value::Config(config) = value else {
            return;
        };
        match self.style {
            Style::Subkey => {
                dict.insert(self.key.to_string(), Json::Object(config.to_dict()));
            }
            Style::Prefixed(_) | Style::Inline => {
                let prefix = self.style.prefix();
                for (key, value) in config.to_dict() {
                    dict.insert(prefixed(prefix, &key), value);
                }
            }
        }
    }

    pub fn markdown(&self) -> Vec<(String, String)> {
        if self.style == Style::Subkey {
            let mut markdown = format!(
                "{}\n\nThis key must be a dictionary describing a {} object.",
                self.doc,
                self.schema.link()
            );
            if self.optional {
                markdown.push_str(" It may be omitted, in which case there is no such object.");
            }
            return vec![(self.key.to_string(), markdown)];
        }

        let prefix = self.style.prefix();
        let mut entries = Vec::new();
        for loader in self.schema.loaders() {
            for (key, body) in loader.markdown() {
                let mut markdown = format!(
                    "{body}\n\nThis key belongs to the `{}` object ({}), embedded here: {}",
                    self.key,
                    self.schema.link(),
                    self.doc
                );
                if self.optional {
                    markdown.push_str(
                        " The object is optional, so all of its keys may be omitted together.",
                    );
                }
                entries.push((prefixed(prefix, &key), markdown));
            }
        }
        entries
    }
}
