//! Loaders convert one configuration key (or group of keys) between a
//! dictionary fragment and a [Value].
//!
//! A [crate::schema::Schema] is an ordered list of loaders. Each loader
//! removes the keys it owns from the dictionary while deserializing, and
//! writes exactly those keys back while serializing.

mod choice;
mod flag;
mod parsed;
mod select;
mod subconfig;

pub use choice::{Alternative, Choice, Kind, Matcher};
pub use flag::Flag;
pub use parsed::{FormatFn, ParseFn, Parsed};
pub use select::{Select, Variant};
pub use subconfig::{Style, SubConfig};

use crate::{
    context::LoadContext,
    errors::{ConfigError, ErrorKind, Result},
    schema::Schema,
    value::{Dict, Value},
};

/// A loader descriptor.
#[derive(Debug)]
pub enum Loader {
    Choice(Choice),
    Flag(Flag),
    Parsed(Parsed),
    Select(Select),
    SubConfig(SubConfig),
}

impl Loader {
    /// Canonical key: the key the value is stored under in a
    /// [crate::schema::Config].
    pub fn key(&self) -> &'static str {
        match self {
            Loader::Choice(l) => l.key(),
            Loader::Flag(l) => l.key(),
            Loader::Parsed(l) => l.key(),
            Loader::Select(l) => l.key(),
            Loader::SubConfig(l) => l.key(),
        }
    }

    pub fn doc(&self) -> &'static str {
        match self {
            Loader::Choice(l) => l.doc(),
            Loader::Flag(l) => l.doc(),
            Loader::Parsed(l) => l.doc(),
            Loader::Select(l) => l.doc(),
            Loader::SubConfig(l) => l.doc(),
        }
    }

    /// Whether parsing fails when none of this loader's keys are present.
    pub fn required(&self) -> bool {
        match self {
            Loader::Choice(l) => l.required(),
            Loader::Flag(_) => false,
            Loader::Parsed(l) => l.required(),
            Loader::Select(l) => l.required(),
            Loader::SubConfig(_) => false,
        }
    }

    /// Whether values of this loader may be replaced after construction.
    pub fn mutable(&self) -> bool {
        matches!(self, Loader::Choice(_) | Loader::Flag(_))
    }

    /// Checks that `value` is something [Loader::deserialize] could have
    /// produced. Errors carry no path; the caller adds it.
    pub fn validate(&self, value: &Value) -> Result<()> {
        match self {
            Loader::Choice(l) => l.validate(value),
            Loader::Flag(l) => l.validate(value),
            Loader::Parsed(_) | Loader::Select(_) | Loader::SubConfig(_) => {
                Err(ConfigError::new(ErrorKind::Immutable))
            }
        }
    }

    /// Removes this loader's keys from `dict` and converts them.
    pub fn deserialize(&self, dict: &mut Dict, ctx: &LoadContext<'_>) -> Result<Value> {
        match self {
            Loader::Choice(l) => l.deserialize(dict),
            Loader::Flag(l) => l.deserialize(dict),
            Loader::Parsed(l) => l.deserialize(dict, ctx),
            Loader::Select(l) => l.deserialize(dict, ctx),
            Loader::SubConfig(l) => l.deserialize(dict, ctx),
        }
    }

    /// Writes `value` back into `dict` under the keys
    /// [Loader::deserialize] would have consumed.
    pub fn serialize(&self, dict: &mut Dict, value: &Value) {
        match self {
            Loader::Choice(l) => l.serialize(dict, value),
            Loader::Flag(l) => l.serialize(dict, value),
            Loader::Parsed(l) => l.serialize(dict, value),
            Loader::Select(l) => l.serialize(dict, value),
            Loader::SubConfig(l) => l.serialize(dict, value),
        }
    }

    /// All dictionary keys this loader may consume at the current level.
    pub fn keys(&self) -> Vec<String> {
        match self {
            Loader::Select(l) => l.keys(),
            Loader::SubConfig(l) => l.keys(),
            _ => vec![self.key().to_string()],
        }
    }

    /// `(display key, markdown)` pairs documenting this loader.
    pub fn markdown(&self) -> Vec<(String, String)> {
        match self {
            Loader::Choice(l) => vec![(l.key().to_string(), l.markdown())],
            Loader::Flag(l) => vec![(l.key().to_string(), l.markdown())],
            Loader::Parsed(l) => vec![(l.key().to_string(), l.markdown())],
            Loader::Select(l) => vec![(l.key().to_string(), l.markdown())],
            Loader::SubConfig(l) => l.markdown(),
        }
    }

    /// Schemas that need their own documentation page because
    /// [Loader::markdown] links to them.
    pub fn markdown_more(&self) -> Vec<&'static Schema> {
        match self {
            Loader::Select(l) => l.variants().iter().map(|v| v.schema()).collect(),
            Loader::SubConfig(l) => vec![l.schema()],
            _ => Vec::new(),
        }
    }
}

impl From<Choice> for Loader {
    fn from(value: Choice) -> Self {
        Loader::Choice(value)
    }
}

impl From<Flag> for Loader {
    fn from(value: Flag) -> Self {
        Loader::Flag(value)
    }
}

impl From<Parsed> for Loader {
    fn from(value: Parsed) -> Self {
        Loader::Parsed(value)
    }
}

impl From<Select> for Loader {
    fn from(value: Select) -> Self {
        Loader::Select(value)
    }
}

impl From<SubConfig> for Loader {
    fn from(value: SubConfig) -> Self {
        Loader::SubConfig(value)
    }
}

/// Moves every key `schema` declares from `dict` into a fresh dictionary,
/// stripping `prefix-` on the way.
pub(crate) fn extract(dict: &mut Dict, schema: &Schema, prefix: &str) -> Dict {
    let mut sub = Dict::new();
    for key in schema.keys() {
        if let Some(value) = dict.shift_remove(&prefixed(prefix, &key)) {
            sub.insert(key, value);
        }
    }
    sub
}

pub(crate) fn prefixed(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}-{key}")
    }
}
