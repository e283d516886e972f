//! Decimal type utilities for precise monetary calculations

use rust_decimal::{Decimal, RoundingStrategy};
pub use rust_decimal_macros::dec;

/// Monetary amount with exact decimal precision
pub type Money = Decimal;

/// Precision helpers for money
pub mod precision {
    use super::*;

    /// Number of fractional digits stored for a balance
    pub const MONEY_SCALE: u32 = 2;

    /// Largest storable balance, `NUMERIC(12, 2)`
    pub const MAX_BALANCE: Money = dec!(9999999999.99);

    /// Round to cents, half away from zero
    pub fn round_money(amount: Money) -> Money {
        amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Render with exactly two fractional digits, e.g. `150.00`
    pub fn to_fixed(amount: Money) -> String {
        let mut fixed = round_money(amount);
        fixed.rescale(MONEY_SCALE);
        fixed.to_string()
    }

    /// Whether the amount carries no digits beyond cents
    pub fn fits_scale(amount: Money) -> bool {
        amount.normalize().scale() <= MONEY_SCALE
    }
}

/// Parse a textual amount, accepting plain and scientific notation
///
/// Digits that do not fit are an error, never rounded away, and digit
/// separators are not accepted.
pub fn parse_money(text: &str) -> Option<Money> {
    let text = text.trim();
    if text.is_empty() || text.contains('_') {
        return None;
    }

    Decimal::from_str_exact(text).ok().or_else(|| parse_scientific(text))
}

fn parse_scientific(text: &str) -> Option<Money> {
    let (mantissa, _) = text.split_once(|c: char| c == 'e' || c == 'E')?;
    // from_scientific rounds an over-long mantissa
    Decimal::from_str_exact(mantissa).ok()?;
    Decimal::from_scientific(text).ok()
}

/// Serialize money as a fixed-point string (`"150.00"`)
pub mod serde_fixed {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{parse_money, precision, Money};

    pub fn serialize<S>(amount: &Money, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&precision::to_fixed(*amount))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Money, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        parse_money(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid fixed-point amount: {}", text)))
    }
}
