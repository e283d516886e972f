//! Identity service implementation

use std::sync::Arc;

use chrono::Utc;
use common::db::DbPool;
use common::error::{Error, ErrorExt, Result};
use common::model::user::{base_username, NewUser, User};
use rand::Rng;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::IdentityServiceConfig;
use crate::password;
use crate::repository::{InMemoryUserRepository, PostgresUserRepository, UserRepository};
use crate::token::TokenService;

/// Times a registration is retried when its generated username is taken
/// concurrently
const USERNAME_ATTEMPTS: usize = 5;

const MIN_PASSWORD_LEN: usize = 8;
const MAX_NAME_LEN: usize = 255;

/// Identity service for registering and authenticating users
pub struct IdentityService {
    /// Repository for user data
    repo: Arc<dyn UserRepository>,
    tokens: TokenService,
}

/// Repository Type
pub enum RepositoryType {
    /// In-memory repository
    InMemory,
    /// PostgreSQL repository on an existing pool
    Postgres(DbPool),
}

impl IdentityService {
    /// Create an identity service with a specific repository type
    ///
    /// A PostgreSQL-backed service must be given a signing secret, since
    /// users outlive the process. In memory, a random one is generated.
    pub fn with_repository(repo_type: RepositoryType, config: &IdentityServiceConfig) -> Result<Self> {
        let (repo, secret): (Arc<dyn UserRepository>, Vec<u8>) = match repo_type {
            RepositoryType::InMemory => {
                let secret = match &config.jwt_secret {
                    Some(secret) => secret.as_bytes().to_vec(),
                    None => {
                        warn!("JWT_SECRET not set, using a random secret for this process");
                        rand::thread_rng().gen::<[u8; 32]>().to_vec()
                    }
                };
                (Arc::new(InMemoryUserRepository::new()), secret)
            }
            RepositoryType::Postgres(pool) => {
                let secret = config.jwt_secret.as_ref().ok_or_else(|| {
                    Error::ConfigurationError("JWT_SECRET must be set when using PostgreSQL".to_string())
                })?;
                (Arc::new(PostgresUserRepository::new(pool)), secret.as_bytes().to_vec())
            }
        };

        let tokens = TokenService::new(&secret, config.access_ttl(), config.refresh_ttl());
        Ok(Self::from_repository(repo, tokens))
    }

    /// Create an identity service over an explicit repository and token service
    pub fn from_repository(repo: Arc<dyn UserRepository>, tokens: TokenService) -> Self {
        Self { repo, tokens }
    }

    /// Token issuer and validator
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Register a new user
    pub async fn register(&self, new_user: NewUser) -> Result<User> {
        let email = normalize_email(&new_user.email)?;
        let first_name = required_name(&new_user.first_name, "first_name")?;
        let last_name = required_name(&new_user.last_name, "last_name")?;

        if new_user.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::ValidationError(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if new_user.password != new_user.password_confirm {
            return Err(Error::ValidationError("Passwords do not match".to_string()));
        }
        if self.repo.get_user_by_email(&email).await?.is_some() {
            return Err(Error::DuplicateEmail("An account with this email exists".to_string()));
        }

        let password_hash = hash_blocking(new_user.password).await?;
        let base = base_username(&first_name, &last_name);

        for _ in 0..USERNAME_ATTEMPTS {
            let user = User {
                id: Uuid::new_v4(),
                email: email.clone(),
                username: self.unique_username(&base).await?,
                first_name: first_name.clone(),
                last_name: last_name.clone(),
                password_hash: password_hash.clone(),
                date_joined: Utc::now(),
            };

            match self.repo.create_user(user).await {
                Ok(user) => {
                    info!("Registered user {} ({})", user.username, user.id);
                    return Ok(user);
                }
                Err(Error::Conflict(msg)) => warn!("{}, choosing another username", msg),
                Err(e) => return Err(e),
            }
        }

        Err(Error::Conflict(format!("Could not allocate a username from {:?}", base)))
    }

    /// Authenticate by email and password
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let email = email.trim().to_lowercase();
        let password = password.to_string();

        let Some(user) = self.repo.get_user_by_email(&email).await? else {
            // Same work as a real check, so response time does not reveal
            // whether the email is registered
            tokio::task::spawn_blocking(move || password::verify_against_dummy(&password))
                .await
                .map_err(|e| Error::Internal(format!("Password check task failed: {}", e)))?;
            return Err(Error::InvalidCredentials("Invalid email or password".to_string()));
        };

        let hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
            .await
            .map_err(|e| Error::Internal(format!("Password check task failed: {}", e)))??;

        if !matches {
            return Err(Error::InvalidCredentials("Invalid email or password".to_string()));
        }

        info!("User {} logged in", user.id);
        Ok(user)
    }

    /// Get a user by ID
    pub async fn get_user(&self, id: Uuid) -> Result<User> {
        self.repo
            .get_user(id)
            .await
            .with_context(|| format!("Failed to retrieve user {}", id))?
            .ok_or_else(|| Error::UserNotFound(format!("User not found: {}", id)))
    }

    /// First free username of the form `base`, `base1`, `base2`, ...
    async fn unique_username(&self, base: &str) -> Result<String> {
        let base = if base.is_empty() { "user" } else { base };

        let mut candidate = base.to_string();
        let mut counter = 1;
        while self.repo.username_exists(&candidate).await? {
            candidate = format!("{}{}", base, counter);
            counter += 1;
        }
        Ok(candidate)
    }
}

async fn hash_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| Error::Internal(format!("Password hashing task failed: {}", e)))?
}

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(Error::ValidationError("Enter a valid email address".to_string()));
    }
    Ok(email)
}

fn required_name(value: &str, field: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::ValidationError(format!("{} is required", field)));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(Error::ValidationError(format!(
            "{} must be at most {} characters",
            field, MAX_NAME_LEN
        )));
    }
    Ok(value.to_string())
}
