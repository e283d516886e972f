//! Account models and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{serde_fixed, Money};

/// Account type assigned when none is configured
pub const DEFAULT_ACCOUNT_TYPE: &str = "Premium Elite";

/// Prefix of every generated account number
pub const ACCOUNT_NUMBER_PREFIX: &str = "NB";

/// Bank account owned by exactly one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique account ID
    pub id: Uuid,
    /// Owning user ID
    pub owner_id: Uuid,
    /// Current balance, never negative
    #[serde(with = "serde_fixed")]
    pub balance: Money,
    /// Display identifier, e.g. `NB4821730915`
    pub account_number: String,
    /// Account tier shown to the customer
    pub account_type: String,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last balance change
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Open a zero-balance account for an owner
    pub fn open(owner_id: Uuid, account_number: String, account_type: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            balance: Money::ZERO,
            account_number,
            account_type: account_type.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Copy of this account carrying a new balance
    pub fn with_balance(&self, balance: Money) -> Self {
        Self {
            balance,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::dec;

    #[test]
    fn test_open_account_starts_empty() {
        let owner = Uuid::new_v4();
        let account = Account::open(owner, "NB1234567890".to_string(), DEFAULT_ACCOUNT_TYPE);

        assert_eq!(account.owner_id, owner);
        assert_eq!(account.balance, Money::ZERO);
        assert_eq!(account.account_type, "Premium Elite");
        assert_eq!(account.created_at, account.updated_at);
    }

    #[test]
    fn test_balance_serializes_as_fixed_point_string() {
        let account = Account::open(Uuid::new_v4(), "NB1234567890".to_string(), DEFAULT_ACCOUNT_TYPE)
            .with_balance(dec!(150));

        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["balance"], "150.00");

        let back: Account = serde_json::from_value(json).unwrap();
        assert_eq!(back.balance, dec!(150));
    }
}
