use serde_json::Value as Json;
use tracing::debug;

use super::extract;
use crate::{
    context::LoadContext,
    errors::{ConfigError, ErrorKind, Result},
    schema::Schema,
    value::{Dict, Value},
};

/// One alternative of a [Select].
#[derive(Debug)]
pub struct Variant {
    name: &'static str,
    schema: &'static Schema,
    doc: &'static str,
}

impl Variant {
    pub fn new(name: &'static str, schema: &'static Schema, doc: &'static str) -> Self {
        Self { name, schema, doc }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn doc(&self) -> &'static str {
        self.doc
    }
}

/// Tagged union: the tag key names a variant, whose own keys live next to
/// the tag in the same dictionary.
#[derive(Debug)]
pub struct Select {
    key: &'static str,
    doc: &'static str,
    variants: Vec<Variant>,
    default: Option<&'static str>,
}

impl Select {
    pub fn new(key: &'static str, doc: &'static str, variants: Vec<Variant>) -> Self {
        Self {
            key,
            doc,
            variants,
            default: None,
        }
    }

    /// Variant used when the tag key is absent.
    pub fn default(mut self, variant: &'static str) -> Self {
        self.default = Some(variant);
        self
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn doc(&self) -> &'static str {
        self.doc
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    pub fn variant(&self, name: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.name == name)
    }

    pub fn required(&self) -> bool {
        self.default.is_none()
    }

    /// The tag key followed by the keys of every variant, without duplicates.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = vec![self.key.to_string()];
        for variant in &self.variants {
            for key in variant.schema.keys() {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    pub fn deserialize(&self, dict: &mut Dict, ctx: &LoadContext<'_>) -> Result<Value> {
        let tag = match dict.shift_remove(self.key) {
            Some(Json::String(tag)) => tag,
            Some(other) => return Err(ConfigError::type_mismatch(self.key, "a string", &other)),
            None => match self.default {
                Some(default) => default.to_string(),
                None => return Err(ConfigError::at(self.key, ErrorKind::MissingRequiredKey)),
            },
        };

        let variant = self.variant(&tag).ok_or_else(|| {
            ConfigError::at(
                self.key,
                ErrorKind::InvalidChoice {
                    value: Json::String(tag.clone()).to_string(),
                },
            )
        })?;
        debug!(key = self.key, variant = variant.name, "selected variant");

        let sub = extract(dict, variant.schema, "");
        let config = variant.schema.from_dict(sub, ctx.parse_context())?;
        Ok(Value::Select {
            variant: variant.name.to_string(),
            config: Box::new(config),
        })
    }

    pub fn serialize(&self, dict: &mut Dict, value: &Value) {
        if let Value::Select { variant, config } = value {
            dict.insert(self.key.to_string(), Json::String(variant.clone()));
            dict.extend(config.to_dict());
        }
    }

    pub fn markdown(&self) -> String {
        let mut markdown = String::from(self.doc);
        markdown.push_str("\n\n");
        match self.default {
            Some(default) => markdown.push_str(&format!(
                "This key is optional and defaults to `{default}`. "
            )),
            None => markdown.push_str("This key is required. "),
        }
        markdown.push_str(
            "The keys of the selected variant are specified next to this key. \
             The following variants are supported:\n",
        );
        for variant in &self.variants {
            markdown.push_str(&format!(
                "\n - `{}`: {} See {}.",
                variant.name,
                variant.doc,
                variant.schema.link()
            ));
        }
        markdown
    }
}
