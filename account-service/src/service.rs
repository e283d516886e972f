//! Account service implementation

use std::sync::Arc;

use common::db::DbPool;
use common::error::{Error, ErrorExt, Result};
use common::model::account::Account;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AccountServiceConfig;
use crate::input::AmountInput;
use crate::mutation::BalanceMutation;
use crate::repository::{AccountRepository, InMemoryAccountRepository, PostgresAccountRepository};

/// Account service binding users to their account and applying balance changes
///
/// Balance writes are serialised per account inside the process and guarded by
/// a compare-and-swap at the store, so concurrent requests never lose updates
/// even when several processes share one database.
pub struct AccountService {
    /// Repository for account data
    repo: Arc<dyn AccountRepository>,
    /// One lock per account, held across load, compute and save
    account_locks: DashMap<Uuid, Arc<Mutex<()>>>,
    config: AccountServiceConfig,
}

/// Repository Type
pub enum RepositoryType {
    /// In-memory repository
    InMemory,
    /// PostgreSQL repository on an existing pool
    Postgres(DbPool),
}

impl AccountService {
    /// Create a new account service backed by memory
    pub fn new() -> Self {
        Self::from_repository(Arc::new(InMemoryAccountRepository::new()), AccountServiceConfig::default())
    }

    /// Create a new account service with a specific repository type
    pub fn with_repository(repo_type: RepositoryType, config: AccountServiceConfig) -> Self {
        let repo: Arc<dyn AccountRepository> = match repo_type {
            RepositoryType::InMemory => Arc::new(InMemoryAccountRepository::new()),
            RepositoryType::Postgres(pool) => Arc::new(PostgresAccountRepository::new(pool)),
        };

        Self::from_repository(repo, config)
    }

    /// Create a new account service over a shared repository
    pub fn from_repository(repo: Arc<dyn AccountRepository>, config: AccountServiceConfig) -> Self {
        Self {
            repo,
            account_locks: DashMap::new(),
            config,
        }
    }

    /// Open the account of a user, or return the one already open
    pub async fn open_account(&self, owner_id: Uuid) -> Result<Account> {
        if let Some(account) = self.repo.get_account_by_owner(owner_id).await? {
            return Ok(account);
        }

        match self.repo.create_account(owner_id, &self.config.default_account_type).await {
            Ok(account) => {
                info!("Opened account {} for user {}", account.account_number, owner_id);
                Ok(account)
            }
            // Lost a race with another opener; theirs is the account
            Err(Error::AccountExists(_)) => self.get_account(owner_id).await,
            Err(e) => Err(e),
        }
    }

    /// Get the account of a user
    pub async fn get_account(&self, owner_id: Uuid) -> Result<Account> {
        self.repo
            .get_account_by_owner(owner_id)
            .await
            .with_context(|| format!("Failed to retrieve account of user {}", owner_id))?
            .ok_or_else(|| Error::AccountNotFound(format!("No account for user {}", owner_id)))
    }

    /// Deposit funds into the account of a user
    pub async fn deposit(&self, owner_id: Uuid, amount: &AmountInput) -> Result<Account> {
        self.mutate(owner_id, BalanceMutation::deposit, amount).await
    }

    /// Withdraw funds from the account of a user
    pub async fn withdraw(&self, owner_id: Uuid, amount: &AmountInput) -> Result<Account> {
        self.mutate(owner_id, BalanceMutation::withdraw, amount).await
    }

    /// Overwrite the balance of a user's account
    pub async fn set_balance(&self, owner_id: Uuid, balance: &AmountInput) -> Result<Account> {
        self.mutate(owner_id, BalanceMutation::set_balance, balance).await
    }

    /// Load, validate, apply and persist one balance mutation
    ///
    /// The account is looked up before the input is validated, so a caller
    /// without an account sees `AccountNotFound` whatever they sent.
    async fn mutate<F>(&self, owner_id: Uuid, validate: F, input: &AmountInput) -> Result<Account>
    where
        F: FnOnce(&AmountInput) -> Result<BalanceMutation>,
    {
        let mut account = self.get_account(owner_id).await?;
        let mutation = validate(input)?;

        let lock = self.lock_for(account.id);
        let _guard = lock.lock().await;

        // Balance may have moved while waiting for the lock
        account = self.get_account(owner_id).await?;

        for attempt in 1..=self.config.max_update_retries {
            let new_balance = mutation.apply(account.balance)?;

            match self
                .repo
                .compare_and_swap_balance(account.id, account.balance, new_balance)
                .await
                .with_context(|| format!("Failed to save {} for account {}", mutation, account.id))?
            {
                Some(updated) => {
                    info!(
                        "Applied {} to account {}: {} -> {}",
                        mutation, updated.account_number, account.balance, updated.balance
                    );
                    return Ok(updated);
                }
                None => {
                    warn!(
                        "Balance of account {} changed concurrently (attempt {}/{}), retrying {}",
                        account.id, attempt, self.config.max_update_retries, mutation
                    );
                    account = self.get_account(owner_id).await?;
                }
            }
        }

        Err(Error::Conflict(format!(
            "Could not apply {} to account {} after {} attempts",
            mutation, account.id, self.config.max_update_retries
        )))
    }

    fn lock_for(&self, account_id: Uuid) -> Arc<Mutex<()>> {
        debug!("Acquiring balance lock for account {}", account_id);
        self.account_locks
            .entry(account_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for AccountService {
    fn default() -> Self {
        Self::new()
    }
}
