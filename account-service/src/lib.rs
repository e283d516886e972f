//! Account service for reading and changing account balances

pub mod service;
pub mod repository;
pub mod mutation;
pub mod input;
pub mod config;

pub use service::AccountService;
pub use service::RepositoryType;
pub use repository::{AccountRepository, InMemoryAccountRepository, PostgresAccountRepository};
pub use mutation::BalanceMutation;
pub use input::AmountInput;
pub use config::AccountServiceConfig;
