//! Configuration for the account service

use std::env;

use common::model::account::DEFAULT_ACCOUNT_TYPE;

/// Configuration for the account service
#[derive(Debug, Clone)]
pub struct AccountServiceConfig {
    /// How many times a balance write is retried after losing a
    /// compare-and-swap race before giving up with `Conflict`
    pub max_update_retries: u32,
    /// Account type given to newly opened accounts
    pub default_account_type: String,
}

impl Default for AccountServiceConfig {
    fn default() -> Self {
        Self {
            max_update_retries: env::var("MAX_UPDATE_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|retries| *retries > 0)
                .unwrap_or(32),
            default_account_type: env::var("DEFAULT_ACCOUNT_TYPE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ACCOUNT_TYPE.to_string()),
        }
    }
}

impl AccountServiceConfig {
    /// Create a new configuration using environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create a new configuration with custom values
    pub fn new(max_update_retries: u32, default_account_type: impl Into<String>) -> Self {
        Self {
            max_update_retries: max_update_retries.max(1),
            default_account_type: default_account_type.into(),
        }
    }
}
