use std::sync::LazyLock;

use crate::{
    loader::Flag,
    schema::{Config, Schema},
};

static ACCESS_PRIVILEGES: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(
        "access_privileges",
        "Access privileges",
        "Defines the privilege levels that are allowed to access a field.",
        vec![
            Flag::new("user", "Whether unprivileged masters (`--0`) can access the field.", true)
                .into(),
            Flag::new(
                "privileged",
                "Whether privileged masters (`--1`) can access the field.",
                true,
            )
            .into(),
            Flag::new(
                "secure",
                "Whether secure transactions (`-0-`) can access the field.",
                true,
            )
            .into(),
            Flag::new(
                "nonsecure",
                "Whether nonsecure transactions (`-1-`) can access the field.",
                true,
            )
            .into(),
            Flag::new("data", "Whether data transactions (`0--`) can access the field.", true)
                .into(),
            Flag::new(
                "instruction",
                "Whether instruction transactions (`1--`) can access the field.",
                true,
            )
            .into(),
        ],
    )
});

pub fn access_privileges() -> &'static Schema {
    &ACCESS_PRIVILEGES
}

/// Decoded access privileges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessPrivileges {
    pub user: bool,
    pub privileged: bool,
    pub secure: bool,
    pub nonsecure: bool,
    pub data: bool,
    pub instruction: bool,
}

impl Default for AccessPrivileges {
    fn default() -> Self {
        Self {
            user: true,
            privileged: true,
            secure: true,
            nonsecure: true,
            data: true,
            instruction: true,
        }
    }
}

impl AccessPrivileges {
    pub fn from_config(config: &Config) -> Self {
        let flag = |key| config.get_bool(key).unwrap_or(true);
        Self {
            user: flag("user"),
            privileged: flag("privileged"),
            secure: flag("secure"),
            nonsecure: flag("nonsecure"),
            data: flag("data"),
            instruction: flag("instruction"),
        }
    }

    /// Whether a transaction with the given AXI4-lite `prot` bits may access
    /// the field. Bit 0 selects privileged, bit 1 nonsecure, bit 2
    /// instruction.
    pub fn allows(&self, prot: u8) -> bool {
        let privilege = if prot & 0b001 != 0 { self.privileged } else { self.user };
        let security = if prot & 0b010 != 0 { self.nonsecure } else { self.secure };
        let kind = if prot & 0b100 != 0 { self.instruction } else { self.data };
        privilege && security && kind
    }

    /// Whether every transaction may access the field.
    pub fn is_unrestricted(&self) -> bool {
        (0..8).all(|prot| self.allows(prot))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::context::ParseContext;

    #[test]
    fn test_defaults_allow_everything() {
        let config = access_privileges()
            .from_value(json!({}), &ParseContext::default())
            .unwrap();
        let access = AccessPrivileges::from_config(&config);
        assert_eq!(access, AccessPrivileges::default());
        assert!(access.is_unrestricted());
    }

    #[test]
    fn test_allows() {
        let config = access_privileges()
            .from_value(json!({"user": false, "instruction": false}), &ParseContext::default())
            .unwrap();
        let access = AccessPrivileges::from_config(&config);
        assert!(!access.allows(0b000));
        assert!(access.allows(0b001));
        assert!(access.allows(0b011));
        assert!(!access.allows(0b101));
        assert!(!access.is_unrestricted());
    }
}
