use rust_decimal::Decimal;

use crate::config::StoreConfig;
use crate::domain::{
    Account, AccountId, Currency, Entry, Transfer, TransferId, TransferOutcome, TransferParams,
    TransferRequest, User,
};
use crate::storage::{SqliteStore, TransferFilter};

use super::{LedgerError, TransferExecutor};

/// Default page size for listings.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Application service in front of the ledger store.
/// Validates client requests and delegates transfers to the executor.
#[derive(Clone)]
pub struct BankService {
    executor: TransferExecutor<SqliteStore>,
}

impl BankService {
    /// Create a new service with the given store.
    pub fn new(store: SqliteStore) -> Self {
        Self {
            executor: TransferExecutor::new(store),
        }
    }

    /// Initialize a new database (creating the file and schema if needed).
    pub async fn init(config: &StoreConfig) -> Result<Self, LedgerError> {
        let store = SqliteStore::init(config).await?;
        Ok(Self::new(store))
    }

    /// Connect to an existing database.
    pub async fn connect(config: &StoreConfig) -> Result<Self, LedgerError> {
        let store = SqliteStore::connect(config, false).await?;
        Ok(Self::new(store))
    }

    pub fn executor(&self) -> &TransferExecutor<SqliteStore> {
        &self.executor
    }

    fn store(&self) -> &SqliteStore {
        self.executor.store()
    }

    // ========================
    // Account operations
    // ========================

    /// Open a new account.
    pub async fn create_account(
        &self,
        owner: &str,
        currency: Currency,
        balance: Decimal,
    ) -> Result<Account, LedgerError> {
        if owner.trim().is_empty() {
            return Err(LedgerError::InvalidRequest(
                "Owner must not be empty".to_string(),
            ));
        }
        Ok(self.store().create_account(owner, currency, balance).await?)
    }

    /// Get an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.store()
            .get_account(id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("account {id}")))
    }

    /// List accounts, one page at a time.
    pub async fn list_accounts(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Account>, LedgerError> {
        validate_page(limit, offset)?;
        Ok(self.store().list_accounts(limit, offset).await?)
    }

    /// Administratively set an account balance.
    pub async fn update_account_balance(
        &self,
        id: AccountId,
        balance: Decimal,
    ) -> Result<Account, LedgerError> {
        Ok(self.store().update_account_balance(id, balance).await?)
    }

    /// Delete an account without ledger history.
    pub async fn delete_account(&self, id: AccountId) -> Result<(), LedgerError> {
        Ok(self.store().delete_account(id).await?)
    }

    // ========================
    // Ledger queries
    // ========================

    /// List entries for an account.
    pub async fn list_entries(
        &self,
        account_id: AccountId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Entry>, LedgerError> {
        validate_page(limit, offset)?;
        self.get_account(account_id).await?;
        Ok(self.store().list_entries(account_id, limit, offset).await?)
    }

    /// Get a transfer by ID.
    pub async fn get_transfer(&self, id: TransferId) -> Result<Transfer, LedgerError> {
        self.store()
            .get_transfer(id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("transfer {id}")))
    }

    /// List transfers with optional filters.
    pub async fn list_transfers(
        &self,
        filter: &TransferFilter,
    ) -> Result<Vec<Transfer>, LedgerError> {
        Ok(self.store().list_transfers(filter).await?)
    }

    // ========================
    // User operations
    // ========================

    /// Register a user. The password must already be hashed.
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        hash_password: &str,
    ) -> Result<User, LedgerError> {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(LedgerError::InvalidRequest(format!(
                "User name must be alphanumeric: '{name}'"
            )));
        }
        if !email.contains('@') {
            return Err(LedgerError::InvalidRequest(format!(
                "Invalid email address: '{email}'"
            )));
        }
        Ok(self.store().create_user(name, email, hash_password).await?)
    }

    /// Get a user by name.
    pub async fn get_user(&self, name: &str) -> Result<User, LedgerError> {
        self.store()
            .get_user(name)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("user {name}")))
    }

    // ========================
    // Transfer operations
    // ========================

    /// Validate a client transfer request and execute it.
    ///
    /// Both accounts must exist and hold the requested currency. Negative resulting
    /// balances and transfers to the same account are allowed.
    pub async fn create_transfer(
        &self,
        request: &TransferRequest,
    ) -> Result<TransferOutcome, LedgerError> {
        if request.from_account_id < 1 || request.to_account_id < 1 {
            return Err(LedgerError::InvalidRequest(
                "Account IDs must be positive".to_string(),
            ));
        }
        if request.amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidRequest(
                "Amount must be positive".to_string(),
            ));
        }

        self.validate_currency(request.from_account_id, request.currency)
            .await?;
        self.validate_currency(request.to_account_id, request.currency)
            .await?;

        self.executor.transfer(TransferParams::from(request)).await
    }

    async fn validate_currency(
        &self,
        account_id: AccountId,
        expected: Currency,
    ) -> Result<(), LedgerError> {
        let account = self.get_account(account_id).await?;
        if account.currency != expected {
            return Err(LedgerError::CurrencyMismatch {
                account_id,
                actual: account.currency,
                given: expected,
            });
        }
        Ok(())
    }
}

fn validate_page(limit: i64, offset: i64) -> Result<(), LedgerError> {
    if limit < 1 || offset < 0 {
        return Err(LedgerError::InvalidRequest(format!(
            "Invalid page: limit {limit}, offset {offset}"
        )));
    }
    Ok(())
}
