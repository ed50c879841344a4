use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use crate::config::StoreConfig;
use crate::domain::{
    AMOUNT_SCALE, Account, AccountId, Currency, Entry, EntryId, MinorUnits, Transfer, TransferId,
    User, from_minor_units, to_minor_units,
};

use super::{LedgerStore, LedgerTx, MIGRATION_001_INITIAL, StoreError};

const ACCOUNT_COLUMNS: &str = "id, owner, currency, balance, created_at";
const ENTRY_COLUMNS: &str = "id, account_id, amount, created_at";
const TRANSFER_COLUMNS: &str = "id, from_account_id, to_account_id, amount, created_at";
const USER_COLUMNS: &str = "name, email, hash_password, created_at, updated_at";

/// Filter for listing transfers. `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct TransferFilter {
    pub from_account_id: Option<AccountId>,
    pub to_account_id: Option<AccountId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// SQLite-backed ledger store.
/// Cloning is cheap: clones share the same connection pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the database described by `config`.
    /// With `create_if_missing`, the database file is created when absent.
    pub async fn connect(config: &StoreConfig, create_if_missing: bool) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(&config.database)
            .create_if_missing(create_if_missing)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(config.busy_timeout())
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database {}", config.database))?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(config: &StoreConfig) -> Result<Self> {
        let store = Self::connect(config, true).await?;
        store.migrate().await?;
        Ok(store)
    }

    // ========================
    // Account operations
    // ========================

    /// Insert a new account with an opening balance.
    pub async fn create_account(
        &self,
        owner: &str,
        currency: Currency,
        balance: Decimal,
    ) -> Result<Account, StoreError> {
        let row = sqlx::query(&format!(
            "INSERT INTO accounts (owner, currency, balance, created_at) VALUES (?, ?, ?, ?) RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(owner)
        .bind(currency.as_str())
        .bind(minor_units(balance)?)
        .bind(Utc::now().to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        row_to_account(&row)
    }

    /// Get an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_account).transpose()
    }

    /// List accounts ordered by ID.
    pub async fn list_accounts(&self, limit: i64, offset: i64) -> Result<Vec<Account>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY id LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_account).collect()
    }

    /// Overwrite an account balance. Administrative correction only; transfers go
    /// through the transactional increment instead.
    pub async fn update_account_balance(
        &self,
        id: AccountId,
        balance: Decimal,
    ) -> Result<Account, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE accounts SET balance = ? WHERE id = ? RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(minor_units(balance)?)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row_to_account(&row),
            None => Err(StoreError::NotFound(format!("account {id}"))),
        }
    }

    /// Delete an account. Accounts referenced by entries or transfers cannot be deleted.
    pub async fn delete_account(&self, id: AccountId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match StoreError::from(e) {
                StoreError::MissingReference(_) => {
                    StoreError::ConstraintViolation(format!("account {id} has ledger history"))
                }
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("account {id}")));
        }
        Ok(())
    }

    // ========================
    // Entry operations
    // ========================

    /// Get an entry by ID.
    pub async fn get_entry(&self, id: EntryId) -> Result<Option<Entry>, StoreError> {
        let row = sqlx::query(&format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_entry).transpose()
    }

    /// List entries of one account, oldest first.
    pub async fn list_entries(
        &self,
        account_id: AccountId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Entry>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries WHERE account_id = ? ORDER BY id LIMIT ? OFFSET ?"
        ))
        .bind(account_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_entry).collect()
    }

    // ========================
    // Transfer operations
    // ========================

    /// Get a transfer by ID.
    pub async fn get_transfer(&self, id: TransferId) -> Result<Option<Transfer>, StoreError> {
        let row = sqlx::query(&format!("SELECT {TRANSFER_COLUMNS} FROM transfers WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_transfer).transpose()
    }

    /// List transfers with optional filters, oldest first.
    pub async fn list_transfers(&self, filter: &TransferFilter) -> Result<Vec<Transfer>, StoreError> {
        let mut query = format!("SELECT {TRANSFER_COLUMNS} FROM transfers WHERE 1=1");

        if filter.from_account_id.is_some() {
            query.push_str(" AND from_account_id = ?");
        }
        if filter.to_account_id.is_some() {
            query.push_str(" AND to_account_id = ?");
        }

        query.push_str(" ORDER BY id LIMIT ? OFFSET ?");

        let mut sql_query = sqlx::query(&query);

        if let Some(from) = filter.from_account_id {
            sql_query = sql_query.bind(from);
        }
        if let Some(to) = filter.to_account_id {
            sql_query = sql_query.bind(to);
        }

        // SQLite treats a negative LIMIT as "no limit"
        let rows = sql_query
            .bind(filter.limit.unwrap_or(-1))
            .bind(filter.offset.unwrap_or(0))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_transfer).collect()
    }

    // ========================
    // User operations
    // ========================

    /// Insert a new user. `hash_password` must already be hashed.
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        hash_password: &str,
    ) -> Result<User, StoreError> {
        let now = Utc::now().to_rfc3339();
        let row = sqlx::query(&format!(
            "INSERT INTO users (name, email, hash_password, created_at, updated_at) VALUES (?, ?, ?, ?, ?) RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(email)
        .bind(hash_password)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        row_to_user(&row)
    }

    /// Get a user by name.
    pub async fn get_user(&self, name: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE name = ?"))
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_user).transpose()
    }
}

#[async_trait]
impl LedgerStore for SqliteStore {
    type Tx = SqliteTx;

    async fn begin(&self) -> Result<SqliteTx, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(SqliteTx { tx })
    }
}

/// An open SQLite transaction.
///
/// The first statement of a transfer is an insert, so the database write lock is
/// requested up front and waits out the busy timeout instead of failing on upgrade.
pub struct SqliteTx {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl LedgerTx for SqliteTx {
    async fn create_transfer(
        &mut self,
        from_account_id: AccountId,
        to_account_id: AccountId,
        amount: Decimal,
    ) -> Result<Transfer, StoreError> {
        let row = sqlx::query(&format!(
            "INSERT INTO transfers (from_account_id, to_account_id, amount, created_at) VALUES (?, ?, ?, ?) RETURNING {TRANSFER_COLUMNS}"
        ))
        .bind(from_account_id)
        .bind(to_account_id)
        .bind(minor_units(amount)?)
        .bind(Utc::now().to_rfc3339())
        .fetch_one(&mut *self.tx)
        .await?;

        row_to_transfer(&row)
    }

    async fn create_entry(
        &mut self,
        account_id: AccountId,
        amount: Decimal,
    ) -> Result<Entry, StoreError> {
        let row = sqlx::query(&format!(
            "INSERT INTO entries (account_id, amount, created_at) VALUES (?, ?, ?) RETURNING {ENTRY_COLUMNS}"
        ))
        .bind(account_id)
        .bind(minor_units(amount)?)
        .bind(Utc::now().to_rfc3339())
        .fetch_one(&mut *self.tx)
        .await?;

        row_to_entry(&row)
    }

    async fn add_account_balance(
        &mut self,
        account_id: AccountId,
        delta: Decimal,
    ) -> Result<Account, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE accounts SET balance = balance + ? WHERE id = ? RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(minor_units(delta)?)
        .bind(account_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        match row {
            Some(row) => row_to_account(&row),
            None => Err(StoreError::NotFound(format!("account {account_id}"))),
        }
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

fn minor_units(amount: Decimal) -> Result<MinorUnits, StoreError> {
    to_minor_units(amount).ok_or_else(|| {
        StoreError::ConstraintViolation(format!(
            "amount {amount} is not representable with {AMOUNT_SCALE} decimal places"
        ))
    })
}

fn parse_timestamp(value: &str, column: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Decode(format!("invalid {column} timestamp '{value}': {e}")))
}

fn row_to_account(row: &SqliteRow) -> Result<Account, StoreError> {
    let currency_str: String = row.try_get("currency")?;
    let created_at_str: String = row.try_get("created_at")?;

    Ok(Account {
        id: row.try_get("id")?,
        owner: row.try_get("owner")?,
        currency: Currency::from_str(&currency_str)
            .ok_or_else(|| StoreError::Decode(format!("invalid currency: {currency_str}")))?,
        balance: from_minor_units(row.try_get("balance")?),
        created_at: parse_timestamp(&created_at_str, "created_at")?,
    })
}

fn row_to_entry(row: &SqliteRow) -> Result<Entry, StoreError> {
    let created_at_str: String = row.try_get("created_at")?;

    Ok(Entry {
        id: row.try_get("id")?,
        account_id: row.try_get("account_id")?,
        amount: from_minor_units(row.try_get("amount")?),
        created_at: parse_timestamp(&created_at_str, "created_at")?,
    })
}

fn row_to_transfer(row: &SqliteRow) -> Result<Transfer, StoreError> {
    let created_at_str: String = row.try_get("created_at")?;

    Ok(Transfer {
        id: row.try_get("id")?,
        from_account_id: row.try_get("from_account_id")?,
        to_account_id: row.try_get("to_account_id")?,
        amount: from_minor_units(row.try_get("amount")?),
        created_at: parse_timestamp(&created_at_str, "created_at")?,
    })
}

fn row_to_user(row: &SqliteRow) -> Result<User, StoreError> {
    let created_at_str: String = row.try_get("created_at")?;
    let updated_at_str: String = row.try_get("updated_at")?;

    Ok(User {
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        hash_password: row.try_get("hash_password")?,
        created_at: parse_timestamp(&created_at_str, "created_at")?,
        updated_at: parse_timestamp(&updated_at_str, "updated_at")?,
    })
}
