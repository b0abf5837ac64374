use std::sync::LazyLock;

use super::identifier;
use crate::{
    loader::{Choice, Kind},
    schema::{Config, Schema},
    value::Value,
};

static METADATA: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(
        "metadata",
        "Metadata",
        "Identification and documentation information for objects within `vhdmmio`.",
        vec![
            Choice::new(
                "mnemonic",
                "The mnemonic of the object. Mnemonics are usually very short, uppercase-only \
                 identifiers. They must be unique within the current context only. If the \
                 mnemonic names an array, it cannot end in a number, since the array index is \
                 added to it.",
            )
            .default(Value::None, "the mnemonic is auto-generated by uppercasing the name.")
            .alternative(identifier("[A-Z][A-Z0-9_]*"), "the mnemonic.")
            .into(),
            Choice::new(
                "name",
                "The name of the object. Names are longer and more descriptive than mnemonics, \
                 and must be unique within the register file. Matching is case-insensitive. \
                 Like mnemonics, array names cannot end in a number.",
            )
            .default(Value::None, "the name is auto-generated by lowercasing the mnemonic.")
            .alternative(identifier("[a-zA-Z][a-zA-Z0-9_]*"), "the name.")
            .into(),
            Choice::new(
                "brief",
                "A brief, one-line markdown description of the object. The magic string \
                 `{index}` is replaced with the array index or range as required by context.",
            )
            .default(Value::None, "the brief is set to the name, followed by a period.")
            .kind(Kind::Str, "the brief documentation.")
            .into(),
            Choice::new(
                "doc",
                "Extended markdown documentation for the object, added after the brief. \
                 `{index}` is replaced in the same way as for `brief`.",
            )
            .default(Value::None, "no extended documentation is provided.")
            .kind(Kind::Str, "the extended documentation.")
            .into(),
        ],
    )
});

pub fn metadata() -> &'static Schema {
    &METADATA
}

/// Read access to a metadata object, resolving the auto-generated defaults.
#[derive(Debug, Clone, Copy)]
pub struct Metadata<'a> {
    config: &'a Config,
}

impl<'a> Metadata<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &'a Config {
        self.config
    }

    /// The mnemonic, or the uppercased name.
    pub fn mnemonic(&self) -> Option<String> {
        match self.config.get_str("mnemonic") {
            Some(mnemonic) => Some(mnemonic.to_string()),
            None => self.config.get_str("name").map(str::to_uppercase),
        }
    }

    /// The name, or the lowercased mnemonic.
    pub fn name(&self) -> Option<String> {
        match self.config.get_str("name") {
            Some(name) => Some(name.to_string()),
            None => self.config.get_str("mnemonic").map(str::to_lowercase),
        }
    }

    /// The brief, or the name followed by a period.
    pub fn brief(&self) -> Option<String> {
        match self.config.get_str("brief") {
            Some(brief) => Some(brief.to_string()),
            None => self.name().map(|name| format!("{name}.")),
        }
    }

    pub fn doc(&self) -> Option<&'a str> {
        self.config.get_str("doc")
    }

    /// Key of the explicitly specified identifier ending in a digit, if any.
    pub(crate) fn numbered_identifier(&self) -> Option<&'static str> {
        ["mnemonic", "name"].into_iter().find(|key| {
            self.config
                .get_str(key)
                .is_some_and(|s| s.ends_with(|c: char| c.is_ascii_digit()))
        })
    }
}
