//! Store port used by the transfer core.
//!
//! The core only needs to open a transaction and perform three writes through it.
//! Everything else (row CRUD, listing) lives on the concrete store.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{Account, AccountId, Entry, Transfer};

use super::StoreError;

/// A ledger store able to open storage transactions.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    type Tx: LedgerTx;

    /// Begin a new storage transaction.
    async fn begin(&self) -> Result<Self::Tx, StoreError>;
}

/// Transactional view of the store. Writes made through it are invisible to other
/// connections until `commit`; dropping it without committing rolls back.
#[async_trait]
pub trait LedgerTx: Send {
    /// Insert a transfer row.
    async fn create_transfer(
        &mut self,
        from_account_id: AccountId,
        to_account_id: AccountId,
        amount: Decimal,
    ) -> Result<Transfer, StoreError>;

    /// Insert a ledger entry (signed amount).
    async fn create_entry(
        &mut self,
        account_id: AccountId,
        amount: Decimal,
    ) -> Result<Entry, StoreError>;

    /// Atomically add `delta` to the account balance and return the updated row.
    /// This is a single read-modify-write statement that also takes the row's write lock.
    async fn add_account_balance(
        &mut self,
        account_id: AccountId,
        delta: Decimal,
    ) -> Result<Account, StoreError>;

    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}
