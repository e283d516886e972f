//! Repository for account data

use async_trait::async_trait;
use chrono::Utc;
use common::decimal::Money;
use common::error::{Error, Result};
use common::model::account::{Account, ACCOUNT_NUMBER_PREFIX};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::Rng;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{debug, warn};
use uuid::Uuid;

/// Attempts at drawing an unused account number before giving up
const ACCOUNT_NUMBER_ATTEMPTS: usize = 8;

const ACCOUNT_COLUMNS: &str =
    "id, owner_id, balance, account_number, account_type, created_at, updated_at";

/// Account repository trait defining the interface for account data storage
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Open the single account of `owner_id`
    ///
    /// Fails with `AccountExists` if the owner already has one.
    async fn create_account(&self, owner_id: Uuid, account_type: &str) -> Result<Account>;

    /// Get an account by ID
    async fn get_account(&self, id: Uuid) -> Result<Option<Account>>;

    /// Get the account owned by a user
    async fn get_account_by_owner(&self, owner_id: Uuid) -> Result<Option<Account>>;

    /// Write `new_balance` only if the stored balance still equals `expected`
    ///
    /// Returns the updated account, or `None` when another writer got there
    /// first. A missing account is `AccountNotFound`.
    async fn compare_and_swap_balance(
        &self,
        account_id: Uuid,
        expected: Money,
        new_balance: Money,
    ) -> Result<Option<Account>>;
}

/// Random display number, `NB` followed by ten digits
pub fn generate_account_number() -> String {
    let digits: u64 = rand::thread_rng().gen_range(1_000_000_000..=9_999_999_999);
    format!("{}{}", ACCOUNT_NUMBER_PREFIX, digits)
}

/// In-memory repository for account data
pub struct InMemoryAccountRepository {
    /// Accounts by ID
    pub accounts: DashMap<Uuid, Account>,
    /// Account ID by owner ID
    pub owners: DashMap<Uuid, Uuid>,
    /// Account ID by account number
    account_numbers: DashMap<String, Uuid>,
}

impl InMemoryAccountRepository {
    /// Create a new in-memory account repository
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            owners: DashMap::new(),
            account_numbers: DashMap::new(),
        }
    }
}

impl Default for InMemoryAccountRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn create_account(&self, owner_id: Uuid, account_type: &str) -> Result<Account> {
        let slot = match self.owners.entry(owner_id) {
            Entry::Occupied(_) => {
                return Err(Error::AccountExists(format!("User {} already has an account", owner_id)))
            }
            Entry::Vacant(slot) => slot,
        };

        for _ in 0..ACCOUNT_NUMBER_ATTEMPTS {
            if let Entry::Vacant(number) = self.account_numbers.entry(generate_account_number()) {
                let account = Account::open(owner_id, number.key().clone(), account_type);
                number.insert(account.id);
                self.accounts.insert(account.id, account.clone());
                slot.insert(account.id);
                return Ok(account);
            }
        }

        Err(Error::Internal("Could not allocate a unique account number".to_string()))
    }

    async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self.accounts.get(&id).map(|a| a.clone()))
    }

    async fn get_account_by_owner(&self, owner_id: Uuid) -> Result<Option<Account>> {
        let account_id = match self.owners.get(&owner_id) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.accounts.get(&account_id).map(|a| a.clone()))
    }

    async fn compare_and_swap_balance(
        &self,
        account_id: Uuid,
        expected: Money,
        new_balance: Money,
    ) -> Result<Option<Account>> {
        let mut account = self
            .accounts
            .get_mut(&account_id)
            .ok_or_else(|| Error::AccountNotFound(format!("Account not found: {}", account_id)))?;

        if account.balance != expected {
            return Ok(None);
        }

        account.balance = new_balance;
        account.updated_at = Utc::now();
        Ok(Some(account.clone()))
    }
}

/// PostgreSQL repository for account data
pub struct PostgresAccountRepository {
    /// Database connection pool
    pool: PgPool,
}

impl PostgresAccountRepository {
    /// Create a new PostgreSQL account repository on an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn account_from_row(row: &PgRow) -> Result<Account> {
        Ok(Account {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            balance: row.try_get("balance")?,
            account_number: row.try_get("account_number")?,
            account_type: row.try_get("account_type")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn create_account(&self, owner_id: Uuid, account_type: &str) -> Result<Account> {
        debug!("Creating account in database for user {}", owner_id);

        for _ in 0..ACCOUNT_NUMBER_ATTEMPTS {
            let account = Account::open(owner_id, generate_account_number(), account_type);

            let inserted = sqlx::query(&format!(
                "INSERT INTO accounts ({cols}) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {cols}",
                cols = ACCOUNT_COLUMNS
            ))
            .bind(account.id)
            .bind(account.owner_id)
            .bind(account.balance)
            .bind(&account.account_number)
            .bind(&account.account_type)
            .bind(account.created_at)
            .bind(account.updated_at)
            .fetch_one(&self.pool)
            .await;

            match inserted {
                Ok(row) => return Self::account_from_row(&row),
                Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                    match db_err.constraint() {
                        Some("accounts_account_number_key") => {
                            warn!("Account number {} already taken, drawing another", account.account_number);
                            continue;
                        }
                        _ => {
                            return Err(Error::AccountExists(format!(
                                "User {} already has an account",
                                owner_id
                            )))
                        }
                    }
                }
                Err(e) => return Err(Error::Database(e)),
            }
        }

        Err(Error::Internal("Could not allocate a unique account number".to_string()))
    }

    async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        debug!("Getting account from database: {}", id);

        let row = sqlx::query(&format!("SELECT {} FROM accounts WHERE id = $1", ACCOUNT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::account_from_row).transpose()
    }

    async fn get_account_by_owner(&self, owner_id: Uuid) -> Result<Option<Account>> {
        debug!("Getting account for user from database: {}", owner_id);

        let row = sqlx::query(&format!("SELECT {} FROM accounts WHERE owner_id = $1", ACCOUNT_COLUMNS))
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::account_from_row).transpose()
    }

    async fn compare_and_swap_balance(
        &self,
        account_id: Uuid,
        expected: Money,
        new_balance: Money,
    ) -> Result<Option<Account>> {
        debug!("Updating balance in database: {} {} -> {}", account_id, expected, new_balance);

        let row = sqlx::query(&format!(
            "UPDATE accounts SET balance = $1, updated_at = NOW() \
             WHERE id = $2 AND balance = $3 RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(new_balance)
        .bind(account_id)
        .bind(expected)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Self::account_from_row(&row).map(Some);
        }

        // No row matched: either the balance moved or the account is gone
        let exists = sqlx::query("SELECT 1 FROM accounts WHERE id = $1")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?
            .is_some();

        if exists {
            Ok(None)
        } else {
            Err(Error::AccountNotFound(format!("Account not found: {}", account_id)))
        }
    }
}
