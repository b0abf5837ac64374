//! # vhdmmio
//!
//! The configuration layer of a register file generator for AXI4-lite
//! busses.
//!
//! Configuration objects are described declaratively by [schema::Schema]s,
//! each a list of [loader::Loader]s. A loader owns one or more keys of the
//! raw dictionary and turns them into a typed [value::Value]; embedded
//! objects can live in a subdictionary, behind a key prefix or inline. Every
//! object serializes back into a dictionary that parses to an equal object,
//! and every schema renders its own markdown documentation page.
//!
//! Field positions are written as bitranges (`[<address>][/<size>][:<high>[..<low>]]`,
//! see [bitrange]) and expanded into physical register segments by
//! [layout], including fields that spill over into the next bus word.
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use vhdmmio::context::ParseContext;
//! use vhdmmio::schemas::FieldDescriptor;
//!
//! let dict = json!({
//!     "bitrange": "8:47..8",
//!     "mnemonic": "DATA",
//!     "behavior": "status",
//! });
//! let field = FieldDescriptor::from_dict(
//!     dict.as_object().unwrap().clone(),
//!     &ParseContext::default(),
//! )
//! .unwrap();
//!
//! let layout = field.layout().unwrap();
//! let segments = &layout.fields[0].segments;
//! assert_eq!(segments.len(), 2);
//! assert_eq!((segments[0].address, segments[0].high, segments[0].low), (0x08, 31, 8));
//! assert_eq!((segments[1].address, segments[1].high, segments[1].low), (0x0C, 15, 0));
//! ```

pub mod bitrange;
pub mod context;
pub mod errors;
pub mod layout;
pub mod loader;
pub mod schema;
pub mod schemas;
pub mod value;
