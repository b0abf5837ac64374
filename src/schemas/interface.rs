use std::sync::LazyLock;

use super::identifier;
use crate::{
    loader::Choice,
    schema::{Config, Schema},
    value::Value,
};

static INTERFACE_OPTIONS: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(
        "interface_options",
        "VHDL interface options",
        "Defines how the VHDL entity interface is generated for a specific object.",
        vec![
            Choice::new(
                "group",
                "Name of the group record used for ports, if any. The ports for any objects \
                 that share the same non-null `group` tag are combined into a single record \
                 pair (`in` and `out`).",
            )
            .default(Value::None, "ports are not grouped in an additional record.")
            .alternative(
                identifier("[a-zA-Z][a-zA-Z0-9_]*"),
                "ports are grouped in a record with the specified name.",
            )
            .into(),
            Choice::new(
                "flatten",
                "Whether the ports for this object should be flattened or combined in a \
                 record (pair).",
            )
            .default(
                Value::Bool(false),
                "all ports needed for this object are combined in a record specific to the \
                 object. For arrays, an array of records is created.",
            )
            .literal(
                Value::Str("record".to_string()),
                "the record mentioned above is flattened out.",
            )
            .literal(
                Value::Bool(true),
                "all port types are flattened to `std_logic`s or `std_logic_vector`s.",
            )
            .into(),
            Choice::new("generic-group", "Same as `group`, but for generics.")
                .default(Value::None, "generics are not grouped in an additional record.")
                .alternative(
                    identifier("[a-zA-Z][a-zA-Z0-9_]*"),
                    "generics are grouped in a record with the specified name.",
                )
                .into(),
            Choice::new("generic-flatten", "Same as `flatten`, but for generics.")
                .default(
                    Value::Bool(false),
                    "all generics needed for this object are combined in a record specific to \
                     the object.",
                )
                .literal(
                    Value::Str("record".to_string()),
                    "the record mentioned above is flattened out.",
                )
                .literal(
                    Value::Bool(true),
                    "all `std_logic`-based generics are flattened.",
                )
                .into(),
        ],
    )
});

pub fn interface_options() -> &'static Schema {
    &INTERFACE_OPTIONS
}

/// How far ports or generics are flattened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flatten {
    /// Combined in a record specific to the object.
    #[default]
    No,
    /// The object record is flattened out.
    Record,
    /// Everything is flattened to `std_logic` and `std_logic_vector`.
    All,
}

impl Flatten {
    fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Bool(true)) => Flatten::All,
            Some(Value::Str(s)) if s == "record" => Flatten::Record,
            _ => Flatten::No,
        }
    }
}

/// Decoded interface options.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InterfaceOptions {
    pub group: Option<String>,
    pub flatten: Flatten,
    pub generic_group: Option<String>,
    pub generic_flatten: Flatten,
}

impl InterfaceOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            group: config.get_str("group").map(str::to_string),
            flatten: Flatten::from_value(config.get("flatten")),
            generic_group: config.get_str("generic-group").map(str::to_string),
            generic_flatten: Flatten::from_value(config.get("generic-flatten")),
        }
    }
}
