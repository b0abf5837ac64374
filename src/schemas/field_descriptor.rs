//! Field descriptors: a single field or an array of fields sharing behavior,
//! differing only in bitrange and array index.

use std::sync::LazyLock;

use serde_json::Value as Json;

use super::{
    access::{AccessPrivileges, access_privileges},
    behavior::{Behavior, constant_behavior, control_behavior, status_behavior},
    interface::{InterfaceOptions, interface_options},
    metadata::{Metadata, metadata},
};
use crate::{
    bitrange::{self, BitRange},
    context::{LoadContext, ParseContext},
    errors::{ConfigError, ErrorKind, Result, ResultExt},
    layout::{self, FieldLayout, MAX_REPEAT, Repetition},
    loader::{Choice, Kind, Parsed, Select, Style, SubConfig, Variant},
    schema::{Config, Schema},
    value::{Dict, Value},
};

const BITRANGE_DOC: &str = "The bitrange determines the size of a field and which addresses it \
is sensitive to, written as `[<address>][/<size>][:<high>[..<low>]]`.

 - `<address>`: byte address in decimal, hexadecimal (`0x...`), octal (`0...`) or binary \
(`0b...`). The value of the `address` key is added to it. Defaults to 0.
 - `/<size>`: the block size, i.e. the number of address LSBs that are not matched. \
Defaults to 2 for 32-bit busses or 3 for 64-bit busses, which is also the minimum.
 - `:<high>`: the high bit or the single bit the field maps to. Defaults to the whole bus \
word.
 - `..<low>`: the low bit. Without it the field is scalar; `:x..x` is a vector of length \
one.

Bit indices may exceed the bus width, in which case the field spills over into the next \
block. For a 32-bit bus, `8:47..8` maps field bits 23..0 to bits 31..8 of 0x08 and field \
bits 39..24 to bits 15..0 of 0x0C.

Examples: `0x10:7..0`, `0x10`, `0x10:5`, `0x10:5..5`, `0x300/6`, `/10`.";

fn parse_bitrange(json: &Json, ctx: &LoadContext<'_>) -> Result<Value> {
    let value = bitrange::parse_value(json, ctx)?;
    let offset = ctx.sibling("address").and_then(Value::as_int).unwrap_or(0);
    if let Some(range) = value.as_bitrange() {
        range.moved(offset)?;
    }
    Ok(value)
}

static FIELD_DESCRIPTOR: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(
        "field_descriptor",
        "Field descriptor",
        "A field descriptor describes either a single field or an array of fields. Each \
         field produced by a field descriptor has exactly the same characteristics, but maps \
         to a different bitrange and uses a different array index on the register file \
         interface. The bitranges are described by a base bitrange (`bitrange`, optionally \
         offset by `address`), a repeat count (`repeat`) and the strides (`stride`, \
         `field-stride` and `field-repeat`).",
        vec![
            Choice::new("address", "Byte-oriented address offset for `bitrange`.")
                .default(Value::Int(0), "no offset.")
                .kind(Kind::Int, "byte-oriented address offset to add to the bitrange.")
                .into(),
            Parsed::new(
                "bitrange",
                BITRANGE_DOC,
                parse_bitrange,
                bitrange::format_value,
            )
            .into(),
            Choice::new(
                "repeat",
                "Whether this descriptor describes a single field or an array of fields.",
            )
            .default(Value::None, "the descriptor describes a single field.")
            .range(
                Some(1),
                Some(i64::from(MAX_REPEAT)),
                "the descriptor describes an array field of the given size.",
            )
            .into(),
            Choice::new(
                "field-repeat",
                "How many fields are placed in each logical register before moving on to the \
                 next. With a `repeat` of 7 and a `field-repeat` of 3, fields 0 to 2 share the \
                 base register, 3 to 5 the next, and 6 the one after that.",
            )
            .default(Value::None, "all fields are placed in the same logical register.")
            .literal(Value::Int(1), "each field gets its own logical register.")
            .range(
                Some(2),
                Some(i64::from(MAX_REPEAT)),
                "the given amount of fields are placed in each logical register.",
            )
            .into(),
            Choice::new(
                "stride",
                "By how many bytes the address advances when moving to the next logical \
                 register.",
            )
            .default(
                Value::None,
                "the address is incremented by the block size. This is not correct when the \
                 logical register is wider than the bus.",
            )
            .kind(
                Kind::Int,
                "the address is incremented by this many bytes. Negative values index \
                 downwards.",
            )
            .into(),
            Choice::new(
                "field-stride",
                "By how many bits the bit indices advance when moving to the next field within \
                 a logical register.",
            )
            .default(Value::None, "the bit index is incremented by the width of the field.")
            .kind(
                Kind::Int,
                "the bit index is incremented by this many bits. Negative values are allowed \
                 as long as no index drops below zero.",
            )
            .into(),
            SubConfig::new(
                "metadata",
                "Metadata for the field(s) described by this field descriptor.",
                metadata(),
                Style::Inline,
            )
            .into(),
            SubConfig::new(
                "register-metadata",
                "Metadata for the logical register(s) surrounding the field(s). When a \
                 single field spans the entire register this defaults to the field metadata.",
                metadata(),
                Style::Prefixed("register"),
            )
            .optional()
            .into(),
            Select::new(
                "behavior",
                "Describes the behavior of this field or array of fields.",
                vec![
                    Variant::new("constant", constant_behavior(), "read-only constant."),
                    Variant::new("control", control_behavior(), "control register."),
                    Variant::new("status", status_behavior(), "status register."),
                ],
            )
            .into(),
            SubConfig::new(
                "read",
                "Which AXI4L `ar_prot` values are acceptable for read transactions.",
                access_privileges(),
                Style::Prefixed("read"),
            )
            .into(),
            SubConfig::new(
                "write",
                "Which AXI4L `aw_prot` values are acceptable for write transactions.",
                access_privileges(),
                Style::Prefixed("write"),
            )
            .into(),
            SubConfig::new(
                "interface",
                "How the VHDL entity interface is generated.",
                interface_options(),
                Style::Subkey,
            )
            .into(),
        ],
    )
});

pub fn field_descriptor() -> &'static Schema {
    &FIELD_DESCRIPTOR
}

/// A parsed field descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    config: Config,
    bitrange: BitRange,
    repetition: Repetition,
    behavior: Behavior,
}

impl FieldDescriptor {
    pub fn from_dict(dict: Dict, ctx: &ParseContext) -> Result<Self> {
        Self::from_config(field_descriptor().from_dict(dict, ctx)?)
    }

    /// Wraps a configuration object produced by the field descriptor schema.
    pub fn from_config(config: Config) -> Result<Self> {
        if config.schema().name() != field_descriptor().name() {
            return Err(ConfigError::new(ErrorKind::InvalidValue {
                reason: format!("expected a field descriptor, got {}", config.schema().name()),
            }));
        }

        let bitrange = config
            .get("bitrange")
            .and_then(Value::as_bitrange)
            .copied()
            .ok_or_else(|| ConfigError::at("bitrange", ErrorKind::MissingRequiredKey))?;

        let repetition = Repetition {
            repeat: count(&config, "repeat")?,
            field_repeat: count(&config, "field-repeat")?,
            stride: config.get_int("stride"),
            field_stride: config.get_int("field-stride"),
        };

        let behavior = match config.get("behavior") {
            Some(value) => Behavior::from_value(value).in_key("behavior")?,
            None => return Err(ConfigError::at("behavior", ErrorKind::MissingRequiredKey)),
        };

        let descriptor = Self {
            config,
            bitrange,
            repetition,
            behavior,
        };

        if descriptor.is_array() {
            if let Some(key) = descriptor.metadata().and_then(|m| m.numbered_identifier()) {
                return Err(ConfigError::at(
                    key,
                    ErrorKind::InvalidValue {
                        reason: "array identifiers cannot end in a number".to_string(),
                    },
                ));
            }
        }

        Ok(descriptor)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn to_dict(&self) -> Dict {
        self.config.to_dict()
    }

    /// Offset added to the bitrange address.
    pub fn address(&self) -> i64 {
        self.config.get_int("address").unwrap_or(0)
    }

    /// The bitrange as written, without the `address` offset.
    pub fn bitrange(&self) -> &BitRange {
        &self.bitrange
    }

    /// The bitrange of index 0, including the `address` offset.
    pub fn base_bitrange(&self) -> Result<BitRange> {
        self.bitrange.moved(self.address()).in_key("bitrange")
    }

    pub fn repetition(&self) -> &Repetition {
        &self.repetition
    }

    pub fn is_array(&self) -> bool {
        self.repetition.repeat.is_some()
    }

    /// Number of fields described.
    pub fn count(&self) -> u32 {
        self.repetition.repeat.unwrap_or(1)
    }

    pub fn behavior(&self) -> &Behavior {
        &self.behavior
    }

    pub fn metadata(&self) -> Option<Metadata<'_>> {
        self.config.get_config("metadata").map(Metadata::new)
    }

    pub fn register_metadata(&self) -> Option<Metadata<'_>> {
        self.config.get_config("register-metadata").map(Metadata::new)
    }

    pub fn read_access(&self) -> AccessPrivileges {
        self.config
            .get_config("read")
            .map(AccessPrivileges::from_config)
            .unwrap_or_default()
    }

    pub fn write_access(&self) -> AccessPrivileges {
        self.config
            .get_config("write")
            .map(AccessPrivileges::from_config)
            .unwrap_or_default()
    }

    pub fn interface(&self) -> InterfaceOptions {
        self.config
            .get_config("interface")
            .map(InterfaceOptions::from_config)
            .unwrap_or_default()
    }

    /// Physical placement of every field index.
    pub fn layout(&self) -> Result<FieldLayout> {
        layout::expand(&self.bitrange, self.address(), &self.repetition).in_key("bitrange")
    }
}

fn count(config: &Config, key: &str) -> Result<Option<u32>> {
    match config.get_int(key) {
        None => Ok(None),
        Some(n) => u32::try_from(n).map(Some).map_err(|_| {
            ConfigError::at(
                key,
                ErrorKind::InvalidValue {
                    reason: format!("{n} is out of range"),
                },
            )
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{context::BusWidth, layout::Segment};

    fn load(value: Json) -> Result<FieldDescriptor> {
        FieldDescriptor::from_dict(value.as_object().unwrap().clone(), &ParseContext::default())
    }

    #[test]
    fn test_minimal() {
        let field = load(json!({"bitrange": "0x10:7..0", "behavior": "control"})).unwrap();
        assert_eq!(field.address(), 0);
        assert_eq!(field.bitrange().to_spec(), "0x10:7..0");
        assert!(!field.is_array());
        assert_eq!(field.count(), 1);
        assert_eq!(field.behavior(), &Behavior::Control { reset: None });
        assert!(field.behavior().bus_writable());
        assert!(field.register_metadata().is_none());
        assert!(field.read_access().is_unrestricted());
        assert_eq!(field.interface(), InterfaceOptions::default());
    }

    #[test]
    fn test_full_round_trip() {
        let field = load(json!({
            "address": 4,
            "bitrange": "0x10:15..8",
            "repeat": 4,
            "field-repeat": 2,
            "stride": 8,
            "mnemonic": "DATA",
            "brief": "data lane {index}.",
            "register-name": "data_reg",
            "behavior": "constant",
            "value": 42,
            "read-user": false,
            "write-secure": false,
            "interface": {"group": "lanes", "flatten": true},
        }))
        .unwrap();

        assert_eq!(field.behavior(), &Behavior::Constant { value: 42 });
        assert!(!field.read_access().user);
        assert!(!field.write_access().secure);
        assert_eq!(field.interface().group.as_deref(), Some("lanes"));
        let register = field.register_metadata().unwrap();
        assert_eq!(register.mnemonic().as_deref(), Some("DATA_REG"));

        let again = FieldDescriptor::from_dict(field.to_dict(), &ParseContext::default()).unwrap();
        assert_eq!(field, again);
    }

    #[test]
    fn test_to_dict_is_complete() {
        let field = load(json!({"bitrange": "3", "behavior": "status"})).unwrap();
        let dict = field.to_dict();
        assert_eq!(dict.get("bitrange"), Some(&json!("0x3")));
        assert_eq!(dict.get("behavior"), Some(&json!("status")));
        assert_eq!(dict.get("latch"), Some(&json!(false)));
        assert_eq!(dict.get("read-user"), Some(&json!(true)));
        assert_eq!(dict.get("interface"), Some(&json!({
            "group": null,
            "flatten": false,
            "generic-group": null,
            "generic-flatten": false,
        })));
        assert!(!dict.contains_key("register-mnemonic"));
    }

    #[test]
    fn test_address_offsets_layout() {
        let field = load(json!({"address": 0x100, "bitrange": "8:47..8", "behavior": "status"}))
            .unwrap();
        assert_eq!(field.base_bitrange().unwrap().address(), 0x108);
        let layout = field.layout().unwrap();
        assert_eq!(
            layout.fields[0].segments,
            vec![
                Segment {
                    address: 0x108,
                    low: 8,
                    high: 31,
                    field_low: 0
                },
                Segment {
                    address: 0x10C,
                    low: 0,
                    high: 15,
                    field_low: 24
                },
            ]
        );
    }

    #[test]
    fn test_negative_address_caught_while_parsing() {
        let err = load(json!({"address": -32, "bitrange": "0x10", "behavior": "status"}))
            .unwrap_err();
        assert_eq!(err.path(), ["bitrange"]);
        assert!(matches!(err.kind(), ErrorKind::InvalidBitRangeValue { .. }));
    }

    #[test]
    fn test_array_layout() {
        let field = load(json!({
            "bitrange": "0:7..0",
            "repeat": 7,
            "field-repeat": 3,
            "behavior": "status",
        }))
        .unwrap();
        let layout = field.layout().unwrap();
        let addresses: Vec<u64> = layout.iter().map(|f| f.address).collect();
        assert_eq!(addresses, [0, 0, 0, 4, 4, 4, 8]);
        let lows: Vec<u32> = layout.iter().map(|f| f.low).collect();
        assert_eq!(lows, [0, 8, 16, 0, 8, 16, 0]);
    }

    #[test]
    fn test_64_bit_context() {
        let field = FieldDescriptor::from_dict(
            json!({"bitrange": "0x10", "behavior": "status"})
                .as_object()
                .unwrap()
                .clone(),
            &ParseContext::new(BusWidth::W64),
        )
        .unwrap();
        assert_eq!(field.bitrange().width(), 64);
        assert_eq!(field.layout().unwrap().fields[0].segments.len(), 1);
    }

    #[test]
    fn test_errors_carry_paths() {
        let err = load(json!({"behavior": "status"})).unwrap_err();
        assert_eq!(err.path(), ["bitrange"]);
        assert_eq!(err.kind(), &ErrorKind::MissingRequiredKey);

        let err = load(json!({"bitrange": "0:3..7", "behavior": "status"})).unwrap_err();
        assert_eq!(err.path(), ["bitrange"]);

        let err = load(json!({"bitrange": "0:x", "behavior": "status"})).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidBitRangeSyntax { .. }));

        let err = load(json!({"bitrange": 0, "behavior": "status", "interface": {"flatten": 1}}))
            .unwrap_err();
        assert_eq!(err.path(), ["interface", "flatten"]);
        assert_eq!(err.to_string(), "interface.flatten: expected a boolean or a string, found an integer");

        let err = load(json!({"bitrange": 0, "behavior": "status", "register-mnemonic": "x"}))
            .unwrap_err();
        assert_eq!(err.path(), ["register-mnemonic"]);

        let err = load(json!({"bitrange": 0, "behavior": "status", "value": 3})).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::UnknownKey);
        assert_eq!(err.path(), ["value"]);

        let err = load(json!({"bitrange": 0, "behavior": "constant"})).unwrap_err();
        assert_eq!(err.path(), ["value"]);
        assert_eq!(err.kind(), &ErrorKind::MissingRequiredKey);

        let err = load(json!({"bitrange": 0, "behavior": "status", "repeat": 0})).unwrap_err();
        assert_eq!(err.path(), ["repeat"]);
    }

    #[test]
    fn test_oversized_inputs_fail_while_parsing() {
        let err = load(json!({"bitrange": "0:4294967295..0", "behavior": "status"})).unwrap_err();
        assert_eq!(err.path(), ["bitrange"]);
        assert!(matches!(err.kind(), ErrorKind::InvalidBitRangeValue { .. }));

        let err = load(json!({
            "bitrange": "0:0",
            "repeat": 4_000_000_000u64,
            "field-repeat": 1,
            "behavior": "status",
        }))
        .unwrap_err();
        assert_eq!(err.path(), ["repeat"]);
        assert!(matches!(err.kind(), ErrorKind::InvalidChoice { .. }));

        let err = load(json!({"bitrange": 0, "behavior": "status", "field-repeat": 5000}))
            .unwrap_err();
        assert_eq!(err.path(), ["field-repeat"]);
    }

    #[test]
    fn test_layout_overflow_is_an_error() {
        let field = load(json!({"bitrange": "/63:95..0", "behavior": "status"})).unwrap();
        let err = field.layout().unwrap_err();
        assert_eq!(err.path(), ["bitrange"]);
        assert!(matches!(err.kind(), ErrorKind::InvalidBitRangeValue { .. }));

        let field = load(json!({
            "bitrange": "0:7..0",
            "repeat": 2,
            "field-stride": 1_i64 << 40,
            "behavior": "status",
        }))
        .unwrap();
        assert!(field.layout().is_err());
    }

    #[test]
    fn test_array_names_cannot_end_in_number() {
        let err = load(json!({
            "bitrange": 0,
            "behavior": "status",
            "repeat": 2,
            "mnemonic": "CH0",
        }))
        .unwrap_err();
        assert_eq!(err.path(), ["mnemonic"]);

        assert!(load(json!({"bitrange": 0, "behavior": "status", "mnemonic": "CH0"})).is_ok());
    }

    #[test]
    fn test_mutation_keeps_descriptor_valid() {
        let field = load(json!({"bitrange": "0:7..0", "behavior": "status"})).unwrap();
        let mut config = field.config().clone();
        config.set("repeat", Value::Int(3)).unwrap();
        assert!(config.set("repeat", Value::Int(0)).is_err());
        assert!(config.set("bitrange", Value::None).is_err());

        let field = FieldDescriptor::from_config(config).unwrap();
        assert_eq!(field.layout().unwrap().len(), 3);
    }

    #[test]
    fn test_markdown() {
        let markdown = field_descriptor().markdown();
        assert!(markdown.starts_with("# Field descriptor\n\n"));
        for key in ["address", "bitrange", "field-repeat", "mnemonic", "register-mnemonic", "behavior", "read-user", "write-data", "interface"] {
            assert!(markdown.contains(&format!("## `{key}`")), "{key}");
        }
        assert!(markdown.contains("[VHDL interface options](interface-options.md)"));
    }
}
