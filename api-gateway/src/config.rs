//! Application configuration

use std::env;

use account_service::AccountServiceConfig;
use identity_service::IdentityServiceConfig;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listening address
    pub addr: String,
    /// Database URL; in-memory stores when absent
    pub database_url: Option<String>,
    /// Database connection pool size
    pub db_pool_size: u32,
    /// Apply SQL migrations at startup
    pub run_migrations: bool,
    /// Account service settings
    pub account: AccountServiceConfig,
    /// Identity service settings
    pub identity: IdentityServiceConfig,
}

impl AppConfig {
    /// Create a new configuration from environment variables
    pub fn new() -> Self {
        Self {
            addr: env::var("ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            db_pool_size: env::var("DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
            run_migrations: env::var("RUN_MIGRATIONS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            account: AccountServiceConfig::from_env(),
            identity: IdentityServiceConfig::from_env(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}
