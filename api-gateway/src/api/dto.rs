//! Response bodies
//!
//! These fix the JSON shape of the API independently of the domain models.

use chrono::{DateTime, Utc};
use common::decimal::precision::to_fixed;
use common::model::account::Account;
use common::model::user::User;
use identity_service::TokenPair;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Account as exposed to its owner
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountDto {
    pub id: Uuid,
    /// Unique account number, `NB` followed by ten digits
    pub account_number: String,
    /// Balance with exactly two fractional digits
    #[schema(example = "150.00")]
    pub balance: String,
    pub account_type: String,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountDto {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            account_number: account.account_number,
            balance: to_fixed(account.balance),
            account_type: account.account_type,
            created_at: account.created_at,
        }
    }
}

/// Result of a balance mutation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    pub message: String,
    pub account: AccountDto,
}

impl TransactionResponse {
    pub fn new(message: &str, account: Account) -> Self {
        Self {
            message: message.to_string(),
            account: account.into(),
        }
    }
}

/// User profile
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub date_joined: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            date_joined: user.date_joined,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokensDto {
    /// Long-lived token for minting access tokens
    pub refresh: String,
    /// Bearer token for API calls
    pub access: String,
}

impl From<TokenPair> for TokensDto {
    fn from(pair: TokenPair) -> Self {
        Self {
            refresh: pair.refresh,
            access: pair.access,
        }
    }
}

/// Result of registering or logging in
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserDto,
    pub tokens: TokensDto,
}

impl AuthResponse {
    pub fn new(message: &str, user: User, tokens: TokenPair) -> Self {
        Self {
            message: message.to_string(),
            user: user.into(),
            tokens: tokens.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccessTokenResponse {
    pub access: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    pub message: String,
}
