//! Error types for the NeoBank services
//!
//! This module provides a unified error handling system for every crate in
//! the workspace. It defines standard error types that can be used across
//! service boundaries and provides consistent error conversion.

use std::fmt::Display;
use thiserror::Error;

/// NeoBank error type
#[derive(Debug, Error)]
pub enum Error {
    /// The caller has no account, or the account row disappeared
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Amount missing, non-numeric, out of range or of the wrong sign
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Withdrawal exceeds the current balance
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// An account already exists for this owner
    #[error("Account already exists: {0}")]
    AccountExists(String),

    /// Concurrent updates kept invalidating a balance write
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Error when a user cannot be found
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Email address already registered
    #[error("Duplicate email: {0}")]
    DuplicateEmail(String),

    /// Wrong email or password
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Missing, malformed, expired or revoked token
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Generic validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error is caused by the request rather than the server
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Error::ConfigurationError(_)
                | Error::Internal(_)
                | Error::Database(_)
                | Error::Migration(_)
                | Error::Serialization(_)
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait to add context to error results
pub trait ErrorExt<T> {
    /// Add context information to an error
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display;
}

impl<T> ErrorExt<T> for Result<T> {
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display,
    {
        self.map_err(|e| {
            let context = context_fn().to_string();
            match e {
                Error::AccountNotFound(msg) => Error::AccountNotFound(format!("{}: {}", context, msg)),
                Error::InvalidAmount(msg) => Error::InvalidAmount(format!("{}: {}", context, msg)),
                Error::InsufficientFunds(msg) => Error::InsufficientFunds(format!("{}: {}", context, msg)),
                Error::AccountExists(msg) => Error::AccountExists(format!("{}: {}", context, msg)),
                Error::Conflict(msg) => Error::Conflict(format!("{}: {}", context, msg)),
                Error::UserNotFound(msg) => Error::UserNotFound(format!("{}: {}", context, msg)),
                Error::DuplicateEmail(msg) => Error::DuplicateEmail(format!("{}: {}", context, msg)),
                Error::InvalidCredentials(msg) => Error::InvalidCredentials(format!("{}: {}", context, msg)),
                Error::AuthenticationError(msg) => Error::AuthenticationError(format!("{}: {}", context, msg)),
                Error::ValidationError(msg) => Error::ValidationError(format!("{}: {}", context, msg)),
                Error::ConfigurationError(msg) => Error::ConfigurationError(format!("{}: {}", context, msg)),
                Error::Internal(msg) => Error::Internal(format!("{}: {}", context, msg)),
                Error::Database(e) => Error::Database(e),
                Error::Migration(e) => Error::Migration(e),
                Error::Serialization(e) => Error::Serialization(e),
            }
        })
    }
}

/// Trait for converting other error types to our Error type
pub trait IntoError {
    /// Convert to Error
    fn into_error(self, message: &str) -> Error;
}

impl<E: std::error::Error> IntoError for E {
    fn into_error(self, message: &str) -> Error {
        Error::Internal(format!("{}: {}", message, self))
    }
}

/// Convert string messages into an error
impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::Internal(message)
    }
}

/// Convert static string references into an error
impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Error::Internal(message.to_string())
    }
}

/// From rust_decimal::Error
impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::InvalidAmount(err.to_string())
    }
}
