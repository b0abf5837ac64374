//! Error types for schema loading and bitrange layout.
//!
//! Every error carries the path of configuration keys leading to the offending
//! value. Errors raised deep inside an embedded object are rewrapped at every
//! nesting boundary on their way up (see [ResultExt]), so the caller always
//! receives one fully-qualified path.

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// What went wrong, independent of where.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// A key without a default was not specified.
    #[error("missing required key")]
    MissingRequiredKey,

    /// A key was specified that no loader claimed.
    #[error("unknown key")]
    UnknownKey,

    /// The value has the wrong scalar kind.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        /// Human description of the accepted kinds.
        expected: String,
        /// Kind of the value actually found.
        found: &'static str,
    },

    /// The value does not match any declared alternative.
    #[error("{value} is not a valid choice")]
    InvalidChoice {
        /// The offending value, rendered as JSON.
        value: String,
    },

    /// A bitrange string could not be parsed.
    #[error("invalid bitrange syntax in `{spec}`: {reason}")]
    InvalidBitRangeSyntax {
        /// The offending bitrange string.
        spec: String,
        /// What the parser choked on.
        reason: String,
    },

    /// A bitrange parsed but describes an impossible range.
    #[error("invalid bitrange: {reason}")]
    InvalidBitRangeValue {
        /// Which constraint was violated.
        reason: String,
    },

    /// Mutation was attempted on a key whose loader does not support it.
    #[error("key cannot be modified after construction")]
    Immutable,

    /// A mutation was rejected by the loader's validator.
    #[error("value rejected: {reason}")]
    InvalidValue {
        /// Why the value was rejected.
        reason: String,
    },
}

/// An [ErrorKind] together with the key path it occurred at.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {kind}", self.display_path())]
pub struct ConfigError {
    path: Vec<String>,
    kind: ErrorKind,
}

impl ConfigError {
    /// Creates an error without path information.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            path: Vec::new(),
            kind,
        }
    }

    /// Creates an error for the given key.
    pub fn at(key: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            path: vec![key.into()],
            kind,
        }
    }

    /// A [ErrorKind::TypeMismatch] for `key`, naming the kind of `found`.
    pub fn type_mismatch(
        key: impl Into<String>,
        expected: impl Into<String>,
        found: &serde_json::Value,
    ) -> Self {
        Self::at(
            key,
            ErrorKind::TypeMismatch {
                expected: expected.into(),
                found: crate::value::kind_name(found),
            },
        )
    }

    /// An [ErrorKind::InvalidBitRangeSyntax] without path information.
    pub fn bitrange_syntax(spec: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidBitRangeSyntax {
            spec: spec.into(),
            reason: reason.into(),
        })
    }

    /// An [ErrorKind::InvalidBitRangeValue] without path information.
    pub fn bitrange_value(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidBitRangeValue {
            reason: reason.into(),
        })
    }

    /// Wraps a child error: prepends `key` to its path.
    pub fn nested(key: impl Into<String>, mut child: ConfigError) -> Self {
        child.path.insert(0, key.into());
        child
    }

    /// Rewrites the first path element from `key` to `prefix-key`, for errors
    /// coming out of a prefix-embedded object.
    pub fn prefixed(prefix: &str, mut child: ConfigError) -> Self {
        if prefix.is_empty() {
            return child;
        }
        match child.path.first_mut() {
            Some(first) => *first = format!("{prefix}-{first}"),
            None => child.path.push(prefix.to_string()),
        }
        child
    }

    /// Key path from the outermost object inwards.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// What went wrong.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Whether this error was raised inside an embedded object.
    pub fn is_nested(&self) -> bool {
        self.path.len() > 1
    }

    fn display_path(&self) -> String {
        if self.path.is_empty() {
            "<root>".to_string()
        } else {
            self.path.join(".")
        }
    }
}

/// Path-prepending combinators for propagating child failures upward.
pub trait ResultExt<T> {
    /// Prepends `key` to the error path.
    fn in_key(self, key: &str) -> Result<T>;

    /// Rewrites the error path as seen through a `prefix-` embedding.
    fn in_prefix(self, prefix: &str) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn in_key(self, key: &str) -> Result<T> {
        self.map_err(|e| ConfigError::nested(key, e))
    }

    fn in_prefix(self, prefix: &str) -> Result<T> {
        self.map_err(|e| ConfigError::prefixed(prefix, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_prepends_path() {
        let err = ConfigError::at("group", ErrorKind::UnknownKey);
        let err = ConfigError::nested("interface", err);
        assert_eq!(err.path(), ["interface", "group"]);
        assert!(err.is_nested());
    }

    #[test]
    fn test_prefixed_rewrites_first_element() {
        let err = ConfigError::at("mnemonic", ErrorKind::MissingRequiredKey);
        let err = ConfigError::prefixed("register", err);
        assert_eq!(err.path(), ["register-mnemonic"]);
        assert!(!err.is_nested());
    }

    #[test]
    fn test_prefixed_empty_prefix_is_identity() {
        let err = ConfigError::at("user", ErrorKind::UnknownKey);
        assert_eq!(ConfigError::prefixed("", err.clone()), err);
    }

    #[test]
    fn test_display() {
        let err: Result<()> = Err(ConfigError::at("flatten", ErrorKind::UnknownKey));
        let err = err.in_key("interface").unwrap_err();
        assert_eq!(err.to_string(), "interface.flatten: unknown key");

        let err = ConfigError::bitrange_value("low bit is greater than high bit");
        assert_eq!(
            err.to_string(),
            "<root>: invalid bitrange: low bit is greater than high bit"
        );
    }
}
