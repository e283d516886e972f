//! Common types and utilities for the NeoBank services
//!
//! This library contains shared types, utilities, and abstractions used across
//! the account, identity and gateway crates. It provides a unified approach to
//! error handling, money arithmetic, database access, and domain models.

pub mod error;
pub mod model;
pub mod decimal;
pub mod db;

/// Re-export important types
pub use error::{Error, Result, ErrorExt, IntoError};
pub use decimal::*;

// Re-export utoipa for use in model ToSchema derives
#[cfg(feature = "utoipa")]
pub use utoipa;
