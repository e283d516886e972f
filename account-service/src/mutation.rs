//! Balance mutation rules
//!
//! Every operation is a pure function of the current balance and a validated
//! amount. Nothing here touches storage: the service loads the account, asks
//! the mutation for the new balance and persists it.

use std::fmt;

use common::decimal::{precision, Money};
use common::error::{Error, Result};

use crate::input::AmountInput;

/// A validated request to change a balance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceMutation {
    /// Add a strictly positive amount
    Deposit(Money),
    /// Remove a strictly positive amount no larger than the balance
    Withdraw(Money),
    /// Overwrite the balance with a non-negative value
    SetBalance(Money),
}

impl BalanceMutation {
    /// Validate a deposit amount
    pub fn deposit(input: &AmountInput) -> Result<Self> {
        positive(input, "amount").map(BalanceMutation::Deposit)
    }

    /// Validate a withdrawal amount
    pub fn withdraw(input: &AmountInput) -> Result<Self> {
        positive(input, "amount").map(BalanceMutation::Withdraw)
    }

    /// Validate a replacement balance
    pub fn set_balance(input: &AmountInput) -> Result<Self> {
        let value = cents(input.parse("balance")?, "balance")?;
        if value < Money::ZERO {
            return Err(Error::InvalidAmount("Balance cannot be negative".to_string()));
        }
        // "-0" parses as negative zero
        within_limit(value.abs()).map(BalanceMutation::SetBalance)
    }

    /// The amount carried by the mutation
    pub fn amount(&self) -> Money {
        match self {
            BalanceMutation::Deposit(amount)
            | BalanceMutation::Withdraw(amount)
            | BalanceMutation::SetBalance(amount) => *amount,
        }
    }

    /// Compute the balance that results from applying this mutation
    pub fn apply(&self, balance: Money) -> Result<Money> {
        match *self {
            BalanceMutation::Deposit(amount) => {
                let total = balance.checked_add(amount).ok_or_else(|| {
                    Error::InvalidAmount(format!("Deposit of {} overflows the balance", amount))
                })?;
                within_limit(total)
            }
            BalanceMutation::Withdraw(amount) => {
                if amount > balance {
                    return Err(Error::InsufficientFunds(format!(
                        "Cannot withdraw {} from a balance of {}",
                        precision::to_fixed(amount),
                        precision::to_fixed(balance)
                    )));
                }
                Ok(balance - amount)
            }
            BalanceMutation::SetBalance(value) => Ok(value),
        }
    }
}

impl fmt::Display for BalanceMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amount = precision::to_fixed(self.amount());
        match self {
            BalanceMutation::Deposit(_) => write!(f, "deposit of {}", amount),
            BalanceMutation::Withdraw(_) => write!(f, "withdrawal of {}", amount),
            BalanceMutation::SetBalance(_) => write!(f, "balance set to {}", amount),
        }
    }
}

fn positive(input: &AmountInput, field: &str) -> Result<Money> {
    let amount = cents(input.parse(field)?, field)?;
    if amount <= Money::ZERO {
        return Err(Error::InvalidAmount(format!("{} must be positive", field)));
    }
    within_limit(amount)
}

fn cents(amount: Money, field: &str) -> Result<Money> {
    if !precision::fits_scale(amount) {
        return Err(Error::InvalidAmount(format!(
            "{} cannot have more than {} decimal places",
            field,
            precision::MONEY_SCALE
        )));
    }
    Ok(amount)
}

fn within_limit(amount: Money) -> Result<Money> {
    if amount > precision::MAX_BALANCE {
        return Err(Error::InvalidAmount(format!(
            "{} exceeds the maximum balance of {}",
            amount,
            precision::to_fixed(precision::MAX_BALANCE)
        )));
    }
    Ok(amount)
}
