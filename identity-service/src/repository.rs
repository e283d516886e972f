//! Repository for user data

use async_trait::async_trait;
use common::error::{Error, Result};
use common::model::user::User;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::debug;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, username, first_name, last_name, password_hash, date_joined";

/// User repository trait defining the interface for user data storage
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Store a new user
    ///
    /// Fails with `DuplicateEmail` if the email is registered and with
    /// `Conflict` if the username was taken in the meantime.
    async fn create_user(&self, user: User) -> Result<User>;

    /// Get a user by ID
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;

    /// Get a user by (lowercase) email
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Whether a username is already in use
    async fn username_exists(&self, username: &str) -> Result<bool>;
}

/// In-memory repository for user data
pub struct InMemoryUserRepository {
    /// Users by ID
    pub users: DashMap<Uuid, User>,
    emails: DashMap<String, Uuid>,
    usernames: DashMap<String, Uuid>,
}

impl InMemoryUserRepository {
    /// Create a new in-memory user repository
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            emails: DashMap::new(),
            usernames: DashMap::new(),
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create_user(&self, user: User) -> Result<User> {
        let email_slot = match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => {
                return Err(Error::DuplicateEmail("An account with this email exists".to_string()))
            }
            Entry::Vacant(slot) => slot,
        };
        let username_slot = match self.usernames.entry(user.username.clone()) {
            Entry::Occupied(_) => {
                return Err(Error::Conflict(format!("Username {} is taken", user.username)))
            }
            Entry::Vacant(slot) => slot,
        };

        self.users.insert(user.id, user.clone());
        email_slot.insert(user.id);
        username_slot.insert(user.id);
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let id = match self.emails.get(email) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn username_exists(&self, username: &str) -> Result<bool> {
        Ok(self.usernames.contains_key(username))
    }
}

/// PostgreSQL repository for user data
pub struct PostgresUserRepository {
    /// Database connection pool
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Create a new PostgreSQL user repository on an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn user_from_row(row: &PgRow) -> Result<User> {
        Ok(User {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            username: row.try_get("username")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            password_hash: row.try_get("password_hash")?,
            date_joined: row.try_get("date_joined")?,
        })
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create_user(&self, user: User) -> Result<User> {
        debug!("Creating user in database: {}", user.id);

        let inserted = sqlx::query(&format!(
            "INSERT INTO users ({cols}) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {cols}",
            cols = USER_COLUMNS
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .bind(user.date_joined)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(row) => Self::user_from_row(&row),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                match db_err.constraint() {
                    Some("users_username_key") => {
                        Err(Error::Conflict(format!("Username {} is taken", user.username)))
                    }
                    _ => Err(Error::DuplicateEmail("An account with this email exists".to_string())),
                }
            }
            Err(e) => Err(Error::Database(e)),
        }
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        debug!("Getting user from database: {}", id);

        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::user_from_row).transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::user_from_row).transpose()
    }

    async fn username_exists(&self, username: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }
}
