//! Identity service: user registration, login and access tokens

pub mod config;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;

pub use config::IdentityServiceConfig;
pub use repository::{InMemoryUserRepository, PostgresUserRepository, UserRepository};
pub use service::{IdentityService, RepositoryType};
pub use token::{Claims, TokenPair, TokenService, TokenType};
