//! Contextual information passed down while parsing.

use std::collections::BTreeMap;

use crate::{
    errors::{ConfigError, ErrorKind, Result},
    value::Value,
};

/// Data width of the AXI4-lite bus the register file is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BusWidth {
    #[default]
    W32,
    W64,
}

impl BusWidth {
    /// Width of the bus in bits.
    pub fn bits(self) -> u32 {
        match self {
            BusWidth::W32 => 32,
            BusWidth::W64 => 64,
        }
    }

    /// Smallest legal block size: the number of address LSBs needed to
    /// address a byte within one bus word.
    pub fn min_block_size(self) -> u8 {
        match self {
            BusWidth::W32 => 2,
            BusWidth::W64 => 3,
        }
    }
}

impl TryFrom<u32> for BusWidth {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            32 => Ok(BusWidth::W32),
            64 => Ok(BusWidth::W64),
            _ => Err(ConfigError::at(
                "bus-width",
                ErrorKind::InvalidChoice {
                    value: value.to_string(),
                },
            )),
        }
    }
}

/// Facts about the surroundings of the object being parsed, supplied by
/// whoever drives the parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseContext {
    pub bus_width: BusWidth,
}

impl ParseContext {
    /// A context for a bus of the given width.
    pub fn new(bus_width: BusWidth) -> Self {
        Self { bus_width }
    }
}

/// What a single loader gets to see while it runs: the parse context and the
/// values of the loaders declared before it in the same schema.
#[derive(Debug, Clone, Copy)]
pub struct LoadContext<'a> {
    parse: &'a ParseContext,
    siblings: &'a BTreeMap<String, Value>,
}

impl<'a> LoadContext<'a> {
    pub(crate) fn new(parse: &'a ParseContext, siblings: &'a BTreeMap<String, Value>) -> Self {
        Self { parse, siblings }
    }

    /// The context of the whole parse.
    pub fn parse_context(&self) -> &'a ParseContext {
        self.parse
    }

    /// Width of the bus being described.
    pub fn bus_width(&self) -> BusWidth {
        self.parse.bus_width
    }

    /// Value of an already-parsed sibling key, if any.
    pub fn sibling(&self, key: &str) -> Option<&'a Value> {
        self.siblings.get(key)
    }
}
