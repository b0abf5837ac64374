use regex::Regex;
use serde_json::Value as Json;

use crate::{
    errors::{ConfigError, ErrorKind, Result},
    value::{Dict, Value, kind_name},
};

/// Scalar kinds a [Matcher::Kind] alternative can accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Int,
    Str,
    Bool,
}

impl Kind {
    fn describe(self) -> &'static str {
        match self {
            Kind::Int => "an integer",
            Kind::Str => "a string",
            Kind::Bool => "a boolean",
        }
    }

    fn accepts(self, json: &Json) -> bool {
        match self {
            Kind::Int => json.is_i64(),
            Kind::Str => json.is_string(),
            Kind::Bool => json.is_boolean(),
        }
    }
}

/// How an alternative decides whether it matches a value.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Exactly this scalar value. `Value::None` matches `null`.
    Literal(Value),
    /// Any value of this kind.
    Kind(Kind),
    /// A string fully matching the regular expression.
    Pattern { source: &'static str, regex: Regex },
    /// An integer within the inclusive bounds.
    Range { min: Option<i64>, max: Option<i64> },
}

impl Matcher {
    /// Builds a pattern matcher. The expression is anchored at both ends.
    pub fn pattern(source: &'static str) -> std::result::Result<Self, regex::Error> {
        Ok(Matcher::Pattern {
            source,
            regex: Regex::new(&format!("^(?:{source})$"))?,
        })
    }

    fn matches(&self, json: &Json) -> bool {
        match self {
            Matcher::Literal(literal) => Value::from_json_scalar(json).as_ref() == Some(literal),
            Matcher::Kind(kind) => kind.accepts(json),
            Matcher::Pattern { regex, .. } => json.as_str().is_some_and(|s| regex.is_match(s)),
            Matcher::Range { min, max } => json.as_i64().is_some_and(|i| {
                min.is_none_or(|min| i >= min) && max.is_none_or(|max| i <= max)
            }),
        }
    }

    /// Whether the matcher could ever accept a value of the same kind as
    /// `json`. Distinguishes type mismatches from invalid choices.
    fn accepts_kind_of(&self, json: &Json) -> bool {
        match self {
            Matcher::Literal(literal) => literal
                .to_json_scalar()
                .is_some_and(|l| kind_name(&l) == kind_name(json)),
            Matcher::Kind(kind) => kind.accepts(json),
            Matcher::Pattern { .. } => json.is_string(),
            Matcher::Range { .. } => json.is_i64(),
        }
    }

    fn kind_description(&self) -> String {
        match self {
            Matcher::Literal(literal) => match literal.to_json_scalar() {
                Some(json) => kind_name(&json).to_string(),
                None => "a scalar".to_string(),
            },
            Matcher::Kind(kind) => kind.describe().to_string(),
            Matcher::Pattern { .. } => "a string".to_string(),
            Matcher::Range { .. } => "an integer".to_string(),
        }
    }

    fn markdown(&self) -> String {
        match self {
            Matcher::Literal(literal) => match literal.to_json_scalar() {
                Some(json) => format!("`{json}`"),
                None => "a literal".to_string(),
            },
            Matcher::Kind(kind) => kind.describe().to_string(),
            Matcher::Pattern { source, .. } => format!("a string matching `{source}`"),
            Matcher::Range { min, max } => match (min, max) {
                (Some(min), Some(max)) => format!("an integer between {min} and {max}"),
                (Some(min), None) => format!("an integer greater than or equal to {min}"),
                (None, Some(max)) => format!("an integer less than or equal to {max}"),
                (None, None) => "an integer".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct Alternative {
    pub matcher: Matcher,
    pub doc: &'static str,
}

/// Loader for keys taking one of a list of alternatives. The first matching
/// alternative wins.
#[derive(Debug)]
pub struct Choice {
    key: &'static str,
    doc: &'static str,
    alternatives: Vec<Alternative>,
    default: Option<usize>,
}

impl Choice {
    pub fn new(key: &'static str, doc: &'static str) -> Self {
        Self {
            key,
            doc,
            alternatives: Vec::new(),
            default: None,
        }
    }

    /// Adds a literal alternative that is also used when the key is absent.
    pub fn default(mut self, value: Value, doc: &'static str) -> Self {
        self.default = Some(self.alternatives.len());
        self.alternatives.push(Alternative {
            matcher: Matcher::Literal(value),
            doc,
        });
        self
    }

    pub fn literal(self, value: Value, doc: &'static str) -> Self {
        self.alternative(Matcher::Literal(value), doc)
    }

    pub fn kind(self, kind: Kind, doc: &'static str) -> Self {
        self.alternative(Matcher::Kind(kind), doc)
    }

    pub fn range(self, min: Option<i64>, max: Option<i64>, doc: &'static str) -> Self {
        self.alternative(Matcher::Range { min, max }, doc)
    }

    pub fn alternative(mut self, matcher: Matcher, doc: &'static str) -> Self {
        self.alternatives.push(Alternative { matcher, doc });
        self
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn doc(&self) -> &'static str {
        self.doc
    }

    pub fn alternatives(&self) -> &[Alternative] {
        &self.alternatives
    }

    pub fn required(&self) -> bool {
        self.default.is_none()
    }

    /// The value used when the key is absent.
    pub fn default_value(&self) -> Option<&Value> {
        match self.default.map(|i| &self.alternatives[i].matcher) {
            Some(Matcher::Literal(value)) => Some(value),
            _ => None,
        }
    }

    pub fn deserialize(&self, dict: &mut Dict) -> Result<Value> {
        match dict.shift_remove(self.key) {
            None => self
                .default_value()
                .cloned()
                .ok_or_else(|| ConfigError::at(self.key, ErrorKind::MissingRequiredKey)),
            Some(json) => self.match_json(&json).map_err(|kind| ConfigError::at(self.key, kind)),
        }
    }

    pub fn serialize(&self, dict: &mut Dict, value: &Value) {
        if let Some(json) = value.to_json_scalar() {
            dict.insert(self.key.to_string(), json);
        }
    }

    pub fn validate(&self, value: &Value) -> Result<()> {
        let json = value.to_json_scalar().ok_or_else(|| {
            ConfigError::new(ErrorKind::InvalidValue {
                reason: "choices only take scalar values".to_string(),
            })
        })?;
        self.match_json(&json)
            .map(|_| ())
            .map_err(|kind| ConfigError::new(ErrorKind::InvalidValue {
                reason: kind.to_string(),
            }))
    }

    fn match_json(&self, json: &Json) -> std::result::Result<Value, ErrorKind> {
        let matched = self
            .alternatives
            .iter()
            .any(|alternative| alternative.matcher.matches(json));
        if matched {
            if let Some(value) = Value::from_json_scalar(json) {
                return Ok(value);
            }
        }

        let kind_known = self
            .alternatives
            .iter()
            .any(|alternative| alternative.matcher.accepts_kind_of(json));
        if kind_known {
            return Err(ErrorKind::InvalidChoice {
                value: json.to_string(),
            });
        }

        let mut expected: Vec<String> = Vec::new();
        for alternative in &self.alternatives {
            let description = alternative.matcher.kind_description();
            if !expected.contains(&description) {
                expected.push(description);
            }
        }
        Err(ErrorKind::TypeMismatch {
            expected: expected.join(" or "),
            found: kind_name(json),
        })
    }

    pub fn markdown(&self) -> String {
        let mut markdown = String::from(self.doc);
        markdown.push_str("\n\n");
        if self.required() {
            markdown.push_str("This key is required. ");
        } else {
            markdown.push_str("This key is optional. ");
        }
        markdown.push_str("The following values are supported:\n");
        for (i, alternative) in self.alternatives.iter().enumerate() {
            markdown.push_str("\n - ");
            markdown.push_str(&alternative.matcher.markdown());
            if Some(i) == self.default {
                markdown.push_str(" (default)");
            }
            markdown.push_str(": ");
            markdown.push_str(alternative.doc);
        }
        markdown
    }
}
