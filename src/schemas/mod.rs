//! The configuration structures of a register file description.

mod access;
mod behavior;
mod field_descriptor;
mod interface;
mod metadata;

pub use access::{AccessPrivileges, access_privileges};
pub use behavior::{Behavior, constant_behavior, control_behavior, status_behavior};
pub use field_descriptor::{FieldDescriptor, field_descriptor};
pub use interface::{Flatten, InterfaceOptions, interface_options};
pub use metadata::{Metadata, metadata};

use crate::{loader::Matcher, schema::Schema};

/// Every built-in schema.
pub fn all() -> Vec<&'static Schema> {
    vec![
        metadata(),
        access_privileges(),
        interface_options(),
        constant_behavior(),
        control_behavior(),
        status_behavior(),
        field_descriptor(),
    ]
}

// Only used with the literal patterns below.
fn identifier(source: &'static str) -> Matcher {
    Matcher::pattern(source).expect("built-in identifier pattern is a valid regex")
}
