//! User identity models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Registered user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,
    /// Login email, stored lowercase
    pub email: String,
    /// Generated unique username
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Argon2 PHC string
    #[serde(skip)]
    pub password_hash: String,
    /// Registration timestamp
    pub date_joined: DateTime<Utc>,
}

/// Registration data submitted by a new user
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub password_confirm: String,
}

impl User {
    /// Display name, "First Last"
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Username candidate derived from first and last name
///
/// Lowercased, with everything except ASCII letters and digits removed.
pub fn base_username(first_name: &str, last_name: &str) -> String {
    format!("{}{}", first_name, last_name)
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}
