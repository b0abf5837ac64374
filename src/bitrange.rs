//! Field position and size notation: `[<address>][/<size>][:<high>[..<low>]]`.
//!
//! - `<address>`: byte address in decimal, hexadecimal (`0x...`), octal
//!   (`0o...` or `0...`) or binary (`0b...`). Defaults to 0.
//! - `/<size>`: block size, the number of address LSBs ignored when matching
//!   the address. Defaults to the bus minimum (2 for 32-bit, 3 for 64-bit).
//! - `:<high>`: a single bit; the field is scalar.
//! - `:<high>..<low>`: a bit vector. `:x..x` is a vector of length one, which
//!   is not the same thing as `:x`.
//!
//! Without a bit index the range covers the whole bus word. Bit
//! indices may exceed the bus width, in which case the field spills over into
//! the following blocks (see [crate::layout]).

use std::fmt;

use serde_json::Value as Json;

use crate::{
    context::{BusWidth, LoadContext},
    errors::{ConfigError, ErrorKind, Result},
    value::{Value, kind_name},
};

/// Highest bit index a field may reach, spillover included.
pub const MAX_BIT: u32 = 4095;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitRange {
    bus_width: BusWidth,
    address: u64,
    size: u8,
    high: u32,
    low: u32,
    scalar: bool,
}

impl BitRange {
    /// A vector range `high..low`.
    pub fn vector(bus_width: BusWidth, address: u64, size: u8, high: u32, low: u32) -> Result<Self> {
        Self::from_parts(
            bus_width,
            i128::from(address),
            i64::from(size),
            i64::from(high),
            i64::from(low),
            false,
        )
    }

    /// A single-bit range.
    pub fn scalar(bus_width: BusWidth, address: u64, size: u8, bit: u32) -> Result<Self> {
        Self::from_parts(
            bus_width,
            i128::from(address),
            i64::from(size),
            i64::from(bit),
            i64::from(bit),
            true,
        )
    }

    /// A range covering a full bus word at `address`.
    pub fn word(bus_width: BusWidth, address: u64) -> Self {
        Self {
            bus_width,
            address,
            size: bus_width.min_block_size(),
            high: bus_width.bits() - 1,
            low: 0,
            scalar: false,
        }
    }

    fn from_parts(
        bus_width: BusWidth,
        address: i128,
        size: i64,
        high: i64,
        low: i64,
        scalar: bool,
    ) -> Result<Self> {
        if address < 0 {
            return Err(ConfigError::bitrange_value(format!(
                "address {address} is negative"
            )));
        }
        let address = u64::try_from(address)
            .map_err(|_| ConfigError::bitrange_value(format!("address {address} is too large")))?;

        let min = bus_width.min_block_size();
        if size < i64::from(min) {
            return Err(ConfigError::bitrange_value(format!(
                "block size {size} is below the minimum of {min} for a {}-bit bus",
                bus_width.bits()
            )));
        }
        let size = u8::try_from(size)
            .ok()
            .filter(|size| *size < 64)
            .ok_or_else(|| ConfigError::bitrange_value(format!("block size {size} is too large")))?;

        if low < 0 {
            return Err(ConfigError::bitrange_value(format!(
                "low bit {low} is negative"
            )));
        }
        if low > high {
            return Err(ConfigError::bitrange_value(format!(
                "low bit {low} is greater than high bit {high}"
            )));
        }
        let high = u32::try_from(high)
            .ok()
            .filter(|high| *high <= MAX_BIT)
            .ok_or_else(|| {
                ConfigError::bitrange_value(format!(
                    "high bit {high} exceeds the maximum of {MAX_BIT}"
                ))
            })?;
        let low = u32::try_from(low)
            .map_err(|_| ConfigError::bitrange_value(format!("low bit {low} is too large")))?;

        Ok(Self {
            bus_width,
            address,
            size,
            high,
            low,
            scalar,
        })
    }

    /// Parses a bitrange string.
    pub fn parse(bus_width: BusWidth, spec: &str) -> Result<Self> {
        let text = spec.trim();
        let (location, bits) = match text.split_once(':') {
            Some((location, bits)) => (location, Some(bits)),
            None => (text, None),
        };
        let (address, size) = match location.split_once('/') {
            Some((address, size)) => (address, Some(size)),
            None => (location, None),
        };

        let address = if address.is_empty() {
            0
        } else {
            parse_int(spec, address, "address", true)?
        };
        let size = match size {
            Some(size) => parse_int(spec, size, "block size", false)?,
            None => i64::from(bus_width.min_block_size()),
        };
        let (high, low, scalar) = match bits {
            None => (i64::from(bus_width.bits() - 1), 0, false),
            Some(bits) => match bits.split_once("..") {
                Some((high, low)) => (
                    parse_int(spec, high, "high bit", false)?,
                    parse_int(spec, low, "low bit", false)?,
                    false,
                ),
                None => {
                    let bit = parse_int(spec, bits, "bit index", false)?;
                    (bit, bit, true)
                }
            },
        };

        Self::from_parts(bus_width, i128::from(address), size, high, low, scalar)
    }

    /// Canonical string representation; [BitRange::parse] inverts it.
    pub fn to_spec(&self) -> String {
        let mut tail = String::new();
        if self.size != self.bus_width.min_block_size() {
            tail.push_str(&format!("/{}", self.size));
        }
        if self.scalar {
            tail.push_str(&format!(":{}", self.high));
        } else if self.high != self.bus_width.bits() - 1 || self.low != 0 {
            tail.push_str(&format!(":{}..{}", self.high, self.low));
        }

        match (self.address, tail.is_empty()) {
            (0, false) => tail,
            (0, true) => "0".to_string(),
            (address, _) => format!("{address:#x}{tail}"),
        }
    }

    /// Returns this range with `offset` added to the address.
    pub fn moved(&self, offset: i64) -> Result<Self> {
        let address = i128::from(self.address) + i128::from(offset);
        Self::from_parts(
            self.bus_width,
            address,
            i64::from(self.size),
            i64::from(self.high),
            i64::from(self.low),
            self.scalar,
        )
    }

    pub fn bus_width(&self) -> BusWidth {
        self.bus_width
    }

    /// Byte address of the first block.
    pub fn address(&self) -> u64 {
        self.address
    }

    /// Block size: the number of ignored address LSBs.
    pub fn size(&self) -> u8 {
        self.size
    }

    pub fn high(&self) -> u32 {
        self.high
    }

    pub fn low(&self) -> u32 {
        self.low
    }

    /// Whether the range was written as a single bit (`:x`).
    pub fn is_scalar(&self) -> bool {
        self.scalar
    }

    /// Number of bits in the field. At most `MAX_BIT + 1`.
    pub fn width(&self) -> u32 {
        self.high - self.low + 1
    }

    /// Number of bytes covered by one block: `2^size`.
    pub fn block_bytes(&self) -> u64 {
        1u64 << self.size
    }

    /// Number of physical registers the range touches.
    pub fn register_count(&self) -> u32 {
        self.high / self.bus_width.bits() - self.low / self.bus_width.bits() + 1
    }
}

impl fmt::Display for BitRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_spec())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for BitRange {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_spec())
    }
}

/// [crate::loader::ParseFn] for bitrange keys. Integers are accepted as plain
/// addresses.
pub fn parse_value(json: &Json, ctx: &LoadContext<'_>) -> Result<Value> {
    let range = match json {
        Json::String(spec) => BitRange::parse(ctx.bus_width(), spec)?,
        Json::Number(n) => match n.as_u64() {
            Some(address) => BitRange::word(ctx.bus_width(), address),
            None => BitRange::parse(ctx.bus_width(), &n.to_string())?,
        },
        other => {
            return Err(ConfigError::new(ErrorKind::TypeMismatch {
                expected: "a string".to_string(),
                found: kind_name(other),
            }));
        }
    };
    Ok(Value::BitRange(range))
}

/// [crate::loader::FormatFn] for bitrange keys.
pub fn format_value(value: &Value) -> Json {
    match value.as_bitrange() {
        Some(range) => Json::String(range.to_spec()),
        None => Json::Null,
    }
}

fn parse_int(spec: &str, text: &str, what: &str, radix_prefixes: bool) -> Result<i64> {
    let invalid = || ConfigError::bitrange_syntax(spec, format!("invalid {what} `{text}`"));

    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let (radix, digits) = if radix_prefixes {
        split_radix(digits)
    } else {
        (10, digits)
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid());
    }

    let magnitude = i64::from_str_radix(digits, radix).map_err(|_| invalid())?;
    Ok(if negative { -magnitude } else { magnitude })
}

fn split_radix(text: &str) -> (u32, &str) {
    let lower = text.get(..2).map(str::to_ascii_lowercase);
    match lower.as_deref() {
        Some("0x") => (16, &text[2..]),
        Some("0b") => (2, &text[2..]),
        Some("0o") => (8, &text[2..]),
        _ if text.len() > 1 && text.starts_with('0') => (8, &text[1..]),
        _ => (10, text),
    }
}
