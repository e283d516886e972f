//! Configuration for the identity service

use std::env;

use chrono::Duration;

/// Configuration for the identity service
#[derive(Debug, Clone)]
pub struct IdentityServiceConfig {
    /// HMAC secret for signing tokens
    pub jwt_secret: Option<String>,
    /// Access token lifetime in minutes
    pub access_token_ttl_minutes: i64,
    /// Refresh token lifetime in days
    pub refresh_token_ttl_days: i64,
}

impl Default for IdentityServiceConfig {
    fn default() -> Self {
        Self {
            jwt_secret: env::var("JWT_SECRET").ok().filter(|s| !s.is_empty()),
            access_token_ttl_minutes: env::var("ACCESS_TOKEN_TTL_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            refresh_token_ttl_days: env::var("REFRESH_TOKEN_TTL_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(7),
        }
    }
}

impl IdentityServiceConfig {
    /// Create a new configuration using environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create a new configuration with custom values
    pub fn new(jwt_secret: Option<String>, access_token_ttl_minutes: i64, refresh_token_ttl_days: i64) -> Self {
        Self {
            jwt_secret,
            access_token_ttl_minutes,
            refresh_token_ttl_days,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        Duration::minutes(self.access_token_ttl_minutes)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::days(self.refresh_token_ttl_days)
    }
}
