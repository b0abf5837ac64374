use std::sync::LazyLock;

use crate::{
    errors::{ConfigError, ErrorKind, Result},
    loader::{Choice, Flag, Kind},
    schema::Schema,
    value::Value,
};

static CONSTANT: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(
        "constant_behavior",
        "Constant behavior",
        "Read-only field returning a constant value.",
        vec![
            Choice::new("value", "The value returned on reads.")
                .kind(Kind::Int, "the constant.")
                .into(),
        ],
    )
});

static CONTROL: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(
        "control_behavior",
        "Control behavior",
        "Register written by the bus and read by the hardware.",
        vec![
            Choice::new("reset", "The value of the register after reset.")
                .default(Value::None, "the register is not reset.")
                .kind(Kind::Int, "the reset value.")
                .into(),
        ],
    )
});

static STATUS: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new(
        "status_behavior",
        "Status behavior",
        "Register written by the hardware and read by the bus.",
        vec![
            Flag::new(
                "latch",
                "Whether the value is latched when the hardware marks it valid, instead of \
                 being passed through combinatorially.",
                false,
            )
            .into(),
        ],
    )
});

pub fn constant_behavior() -> &'static Schema {
    &CONSTANT
}

pub fn control_behavior() -> &'static Schema {
    &CONTROL
}

pub fn status_behavior() -> &'static Schema {
    &STATUS
}

/// Decoded field behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Constant { value: i64 },
    Control { reset: Option<i64> },
    Status { latch: bool },
}

impl Behavior {
    /// Decodes the value of a behavior select key.
    pub fn from_value(value: &Value) -> Result<Self> {
        let (Some(variant), Some(config)) = (value.variant(), value.as_config()) else {
            return Err(ConfigError::new(ErrorKind::InvalidValue {
                reason: "expected a behavior selection".to_string(),
            }));
        };
        match variant {
            "constant" => config
                .get_int("value")
                .map(|value| Behavior::Constant { value })
                .ok_or_else(|| ConfigError::at("value", ErrorKind::MissingRequiredKey)),
            "control" => Ok(Behavior::Control {
                reset: config.get_int("reset"),
            }),
            "status" => Ok(Behavior::Status {
                latch: config.get_bool("latch").unwrap_or(false),
            }),
            other => Err(ConfigError::new(ErrorKind::InvalidChoice {
                value: other.to_string(),
            })),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Behavior::Constant { .. } => "constant",
            Behavior::Control { .. } => "control",
            Behavior::Status { .. } => "status",
        }
    }

    pub fn bus_writable(&self) -> bool {
        matches!(self, Behavior::Control { .. })
    }
}
