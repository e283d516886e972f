//! Typed amount field of a balance request
//!
//! Request bodies carry the amount either as a JSON number or as a numeric
//! string. `AmountInput` captures what was sent without judging it; the
//! mutation rules decide whether it is acceptable.

use common::decimal::{parse_money, Money};
use common::error::{Error, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Raw amount as received from a client
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AmountInput {
    /// Field absent or `null`
    #[default]
    Missing,
    /// String form, e.g. `"50.00"`
    Text(String),
    /// JSON number form, e.g. `50.5`
    Number(serde_json::Number),
    /// Any other JSON type; holds the type name
    Unsupported(&'static str),
}

impl AmountInput {
    /// Parse into money, naming `field` in error messages
    ///
    /// Only checks that the input is present and numeric. Sign and scale are
    /// the mutation's concern.
    pub fn parse(&self, field: &str) -> Result<Money> {
        match self {
            AmountInput::Missing => Err(Error::InvalidAmount(format!("{} is required", field))),
            AmountInput::Text(text) if text.trim().is_empty() => {
                Err(Error::InvalidAmount(format!("{} is required", field)))
            }
            AmountInput::Text(text) => parse_money(text)
                .ok_or_else(|| Error::InvalidAmount(format!("Invalid {}: {:?} is not a number", field, text))),
            AmountInput::Number(number) => parse_money(&number.to_string())
                .ok_or_else(|| Error::InvalidAmount(format!("Invalid {}: {} is out of range", field, number))),
            AmountInput::Unsupported(kind) => Err(Error::InvalidAmount(format!(
                "Invalid {}: expected a number or numeric string, got {}",
                field, kind
            ))),
        }
    }
}

impl From<Option<Value>> for AmountInput {
    fn from(value: Option<Value>) -> Self {
        match value {
            None | Some(Value::Null) => AmountInput::Missing,
            Some(Value::String(text)) => AmountInput::Text(text),
            Some(Value::Number(number)) => AmountInput::Number(number),
            Some(Value::Bool(_)) => AmountInput::Unsupported("boolean"),
            Some(Value::Array(_)) => AmountInput::Unsupported("array"),
            Some(Value::Object(_)) => AmountInput::Unsupported("object"),
        }
    }
}

impl From<Money> for AmountInput {
    fn from(amount: Money) -> Self {
        AmountInput::Text(amount.to_string())
    }
}

impl From<&str> for AmountInput {
    fn from(text: &str) -> Self {
        AmountInput::Text(text.to_string())
    }
}

impl<'de> Deserialize<'de> for AmountInput {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(AmountInput::from(value))
    }
}
