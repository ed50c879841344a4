// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use rust_decimal::Decimal;
use strongroom::application::BankService;
use strongroom::config::StoreConfig;
use strongroom::domain::{Account, Currency};
use strongroom::storage::{SqliteStore, TransferFilter};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(BankService, TempDir)> {
    let (store, temp_dir) = test_store().await?;
    Ok((BankService::new(store), temp_dir))
}

/// Helper to create a migrated store in a temporary database
pub async fn test_store() -> Result<(SqliteStore, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let config = StoreConfig::new(db_path.to_str().unwrap());
    let store = SqliteStore::init(&config).await?;
    Ok((store, temp_dir))
}

pub fn amount(units: i64) -> Decimal {
    Decimal::from(units)
}

/// Test fixture: two EUR accounts with the given opening balances
pub async fn account_pair(store: &SqliteStore, first: i64, second: i64) -> Result<(Account, Account)> {
    let x = store
        .create_account("alice", Currency::Eur, amount(first))
        .await?;
    let y = store
        .create_account("bob", Currency::Eur, amount(second))
        .await?;
    Ok((x, y))
}

pub async fn balance_of(store: &SqliteStore, id: i64) -> Result<Decimal> {
    let account = store
        .get_account(id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("account {} missing", id))?;
    Ok(account.balance)
}

pub async fn transfer_count(store: &SqliteStore) -> Result<usize> {
    Ok(store.list_transfers(&TransferFilter::default()).await?.len())
}

pub async fn entry_count(store: &SqliteStore, account_id: i64) -> Result<usize> {
    Ok(store.list_entries(account_id, 1000, 0).await?.len())
}
