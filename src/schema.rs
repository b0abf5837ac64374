//! Schema: ordered set of loaders used to turn dictionaries into validated
//! [Config] objects and back.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value as Json;
use tracing::{debug, trace};

use crate::{
    context::{LoadContext, ParseContext},
    errors::{ConfigError, ErrorKind, Result, ResultExt},
    loader::Loader,
    value::{Dict, Value, kind_name},
};

/// A configuration structure: a name, documentation and the loaders for its
/// keys in declaration order. Schemas are built once and live in statics.
#[derive(Debug)]
pub struct Schema {
    name: &'static str,
    title: &'static str,
    doc: &'static str,
    loaders: Vec<Loader>,
}

impl Schema {
    pub fn new(
        name: &'static str,
        title: &'static str,
        doc: &'static str,
        loaders: Vec<Loader>,
    ) -> Self {
        Self {
            name,
            title,
            doc,
            loaders,
        }
    }

    /// Identifier, also used for the documentation page name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn title(&self) -> &'static str {
        self.title
    }

    pub fn doc(&self) -> &'static str {
        self.doc
    }

    pub fn loaders(&self) -> &[Loader] {
        &self.loaders
    }

    pub fn loader(&self, key: &str) -> Option<&Loader> {
        self.loaders.iter().find(|loader| loader.key() == key)
    }

    /// Every dictionary key this schema may consume, in declaration order.
    pub fn keys(&self) -> Vec<String> {
        self.loaders.iter().flat_map(Loader::keys).collect()
    }

    /// Keys that more than one loader of this schema would consume. The
    /// first declared loader wins such keys, which is almost never intended.
    pub fn key_conflicts(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        let mut conflicts = Vec::new();
        for key in self.keys() {
            if seen.contains(&key) {
                if !conflicts.contains(&key) {
                    conflicts.push(key);
                }
            } else {
                seen.push(key);
            }
        }
        conflicts
    }

    /// Parses `dict` into a [Config]. Loaders run in declaration order, each
    /// consuming its own keys; anything left afterwards is an unknown key.
    pub fn from_dict(&'static self, mut dict: Dict, ctx: &ParseContext) -> Result<Config> {
        debug!(schema = self.name, keys = dict.len(), "loading configuration");

        let mut values = BTreeMap::new();
        for loader in &self.loaders {
            trace!(schema = self.name, key = loader.key(), "running loader");
            let value = loader.deserialize(&mut dict, &LoadContext::new(ctx, &values))?;
            values.insert(loader.key().to_string(), value);
        }

        if let Some(key) = dict.keys().next() {
            return Err(ConfigError::at(key.clone(), ErrorKind::UnknownKey));
        }
        debug!(schema = self.name, "configuration loaded");

        Ok(Config {
            schema: self,
            values,
        })
    }

    /// Like [Schema::from_dict], for a value that should be a dictionary.
    pub fn from_value(&'static self, value: Json, ctx: &ParseContext) -> Result<Config> {
        match value {
            Json::Object(dict) => self.from_dict(dict, ctx),
            other => Err(ConfigError::new(ErrorKind::TypeMismatch {
                expected: "a dictionary".to_string(),
                found: kind_name(&other),
            })),
        }
    }

    /// File name of the documentation page for this schema.
    pub fn page(&self) -> String {
        format!("{}.md", self.name.replace('_', "-"))
    }

    /// Markdown link to the documentation page for this schema.
    pub fn link(&self) -> String {
        format!("[{}]({})", self.title, self.page())
    }

    /// Renders the documentation page for this schema.
    pub fn markdown(&self) -> String {
        let mut markdown = format!("# {}\n\n{}", self.title, self.doc);
        for loader in &self.loaders {
            for (key, body) in loader.markdown() {
                markdown.push_str(&format!("\n\n## `{key}`\n\n{body}"));
            }
        }
        markdown.push('\n');
        markdown
    }

    /// Schemas the page for this schema links to.
    pub fn markdown_more(&self) -> Vec<&'static Schema> {
        let mut more: Vec<&'static Schema> = Vec::new();
        for schema in self.loaders.iter().flat_map(Loader::markdown_more) {
            if !more.iter().any(|s| s.name == schema.name) {
                more.push(schema);
            }
        }
        more
    }

    /// This schema and everything reachable through [Schema::markdown_more],
    /// each once.
    pub fn documentation_pages(&'static self) -> Vec<&'static Schema> {
        let mut pages: Vec<&'static Schema> = vec![self];
        let mut next = 0;
        while next < pages.len() {
            for schema in pages[next].markdown_more() {
                if !pages.iter().any(|s| s.name == schema.name) {
                    pages.push(schema);
                }
            }
            next += 1;
        }
        pages
    }
}

/// A parsed configuration object.
#[derive(Clone)]
pub struct Config {
    schema: &'static Schema,
    values: BTreeMap<String, Value>,
}

impl Config {
    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_int)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_config(&self, key: &str) -> Option<&Config> {
        self.get(key).and_then(Value::as_config)
    }

    /// Replaces the value of a key after construction. Only loaders that
    /// support mutation accept this, and only for values they could have
    /// parsed themselves.
    pub fn set(&mut self, key: &str, value: Value) -> Result<()> {
        let loader = self
            .schema
            .loader(key)
            .ok_or_else(|| ConfigError::at(key, ErrorKind::UnknownKey))?;
        if !loader.mutable() {
            return Err(ConfigError::at(key, ErrorKind::Immutable));
        }
        loader.validate(&value).in_key(key)?;
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    /// Serializes back into a dictionary that [Schema::from_dict] turns into
    /// an equal object.
    pub fn to_dict(&self) -> Dict {
        let mut dict = Dict::new();
        for loader in &self.schema.loaders {
            if let Some(value) = self.values.get(loader.key()) {
                loader.serialize(&mut dict, value);
            }
        }
        dict
    }
}

impl PartialEq for Config {
    fn eq(&self, other: &Self) -> bool {
        self.schema.name == other.schema.name && self.values == other.values
    }
}

impl Eq for Config {}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("schema", &self.schema.name)
            .field("values", &self.values)
            .finish()
    }
}
