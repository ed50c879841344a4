mod common;

use anyhow::Result;
use common::{amount, test_service};
use rust_decimal::Decimal;
use strongroom::application::{BankService, LedgerError};
use strongroom::config::StoreConfig;
use strongroom::domain::{Currency, TransferRequest};
use strongroom::storage::TransferFilter;
use tempfile::TempDir;

#[tokio::test]
async fn test_init_then_connect() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("bank.db");
    let config = StoreConfig::new(db_path.to_str().unwrap());

    let service = BankService::init(&config).await?;
    let account = service
        .create_account("carol", Currency::Usd, amount(42))
        .await?;

    // Re-running init on an existing database is harmless
    BankService::init(&config).await?;

    let reconnected = BankService::connect(&config).await?;
    let fetched = reconnected.get_account(account.id).await?;
    assert_eq!(fetched, account);

    Ok(())
}

#[tokio::test]
async fn test_connect_to_missing_database_fails() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("absent.db");
    let config = StoreConfig::new(db_path.to_str().unwrap());

    let result = BankService::connect(&config).await;
    assert!(matches!(result, Err(LedgerError::Database(_))));

    Ok(())
}

#[tokio::test]
async fn test_account_lifecycle() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let account = service
        .create_account("dave", Currency::Inr, amount(250))
        .await?;
    assert!(account.id > 0);
    assert_eq!(account.owner, "dave");
    assert_eq!(account.currency, Currency::Inr);
    assert_eq!(account.balance, amount(250));

    let updated = service
        .update_account_balance(account.id, amount(300))
        .await?;
    assert_eq!(updated.balance, amount(300));
    assert_eq!(updated.created_at, account.created_at);

    service.delete_account(account.id).await?;
    let err = service.get_account(account.id).await.unwrap_err();
    assert!(err.is_not_found());

    let err = service.delete_account(account.id).await.unwrap_err();
    assert!(err.is_not_found());

    Ok(())
}

#[tokio::test]
async fn test_list_accounts_pages() -> Result<()> {
    let (service, _temp) = test_service().await?;

    for i in 0..10 {
        service
            .create_account(&format!("owner{i}"), Currency::Eur, amount(i))
            .await?;
    }

    let page = service.list_accounts(5, 5).await?;
    assert_eq!(page.len(), 5);
    assert_eq!(page[0].owner, "owner5");

    let err = service.list_accounts(0, 0).await.unwrap_err();
    assert!(matches!(err, LedgerError::InvalidRequest(_)));

    Ok(())
}

#[tokio::test]
async fn test_create_account_requires_owner() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let err = service
        .create_account("  ", Currency::Eur, amount(0))
        .await
        .unwrap_err();
    assert_eq!(err.http_status(), 400);

    Ok(())
}

#[tokio::test]
async fn test_account_with_history_cannot_be_deleted() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let x = service.create_account("erin", Currency::Eur, amount(100)).await?;
    let y = service.create_account("frank", Currency::Eur, amount(0)).await?;

    service
        .create_transfer(&TransferRequest {
            from_account_id: x.id,
            to_account_id: y.id,
            amount: amount(10),
            currency: Currency::Eur,
        })
        .await?;

    let err = service.delete_account(x.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::ConstraintViolation(_)));
    assert!(service.get_account(x.id).await.is_ok());

    Ok(())
}

#[tokio::test]
async fn test_create_transfer_through_service() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let x = service.create_account("gina", Currency::Eur, amount(100)).await?;
    let y = service.create_account("hank", Currency::Eur, amount(50)).await?;

    let outcome = service
        .create_transfer(&TransferRequest {
            from_account_id: x.id,
            to_account_id: y.id,
            amount: amount(10),
            currency: Currency::Eur,
        })
        .await?;

    assert_eq!(outcome.from_account.balance, amount(90));
    assert_eq!(outcome.to_account.balance, amount(60));

    // JSON shape seen by clients
    let json = serde_json::to_value(&outcome)?;
    for key in ["transfer", "from_entry", "to_entry", "from_account", "to_account"] {
        assert!(json.get(key).is_some(), "missing {key}");
    }

    let fetched = service.get_transfer(outcome.transfer.id).await?;
    assert_eq!(fetched, outcome.transfer);

    let entries = service.list_entries(x.id, 10, 0).await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].amount, amount(-10));

    Ok(())
}

#[tokio::test]
async fn test_transfer_rejects_currency_mismatch() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let x = service.create_account("ivy", Currency::Eur, amount(100)).await?;
    let y = service.create_account("jack", Currency::Usd, amount(50)).await?;

    let err = service
        .create_transfer(&TransferRequest {
            from_account_id: x.id,
            to_account_id: y.id,
            amount: amount(10),
            currency: Currency::Eur,
        })
        .await
        .unwrap_err();

    match err {
        LedgerError::CurrencyMismatch {
            account_id,
            actual,
            given,
        } => {
            assert_eq!(account_id, y.id);
            assert_eq!(actual, Currency::Usd);
            assert_eq!(given, Currency::Eur);
        }
        other => panic!("expected currency mismatch, got {other}"),
    }

    let transfers = service.list_transfers(&TransferFilter::default()).await?;
    assert!(transfers.is_empty());
    assert_eq!(service.get_account(x.id).await?.balance, amount(100));

    Ok(())
}

#[tokio::test]
async fn test_transfer_request_validation() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let x = service.create_account("kim", Currency::Eur, amount(100)).await?;
    let y = service.create_account("lee", Currency::Eur, amount(50)).await?;

    for bad_amount in [Decimal::ZERO, amount(-5)] {
        let err = service
            .create_transfer(&TransferRequest {
                from_account_id: x.id,
                to_account_id: y.id,
                amount: bad_amount,
                currency: Currency::Eur,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidRequest(_)));
    }

    let err = service
        .create_transfer(&TransferRequest {
            from_account_id: 0,
            to_account_id: y.id,
            amount: amount(1),
            currency: Currency::Eur,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidRequest(_)));

    let err = service
        .create_transfer(&TransferRequest {
            from_account_id: x.id,
            to_account_id: y.id + 99,
            amount: amount(1),
            currency: Currency::Eur,
        })
        .await
        .unwrap_err();
    assert_eq!(err.http_status(), 404);

    Ok(())
}

#[tokio::test]
async fn test_list_transfers_filters_by_account() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let x = service.create_account("mia", Currency::Eur, amount(100)).await?;
    let y = service.create_account("ned", Currency::Eur, amount(100)).await?;
    let z = service.create_account("oli", Currency::Eur, amount(100)).await?;

    for (from, to) in [(x.id, y.id), (x.id, z.id), (y.id, x.id), (x.id, y.id)] {
        service
            .create_transfer(&TransferRequest {
                from_account_id: from,
                to_account_id: to,
                amount: amount(1),
                currency: Currency::Eur,
            })
            .await?;
    }

    let from_x_to_y = service
        .list_transfers(&TransferFilter {
            from_account_id: Some(x.id),
            to_account_id: Some(y.id),
            ..TransferFilter::default()
        })
        .await?;
    assert_eq!(from_x_to_y.len(), 2);

    let from_x = service
        .list_transfers(&TransferFilter {
            from_account_id: Some(x.id),
            limit: Some(2),
            ..TransferFilter::default()
        })
        .await?;
    assert_eq!(from_x.len(), 2);
    assert!(from_x[0].id < from_x[1].id);

    let to_x = service
        .list_transfers(&TransferFilter {
            to_account_id: Some(x.id),
            ..TransferFilter::default()
        })
        .await?;
    assert_eq!(to_x.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_users() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let user = service
        .create_user("alice", "alice@example.com", "$argon2id$stub")
        .await?;
    assert_eq!(user.name, "alice");
    assert_eq!(user.created_at, user.updated_at);

    let fetched = service.get_user("alice").await?;
    assert_eq!(fetched, user);

    // Password hashes never leave the service in JSON
    let json = serde_json::to_value(&fetched)?;
    assert!(json.get("hash_password").is_none());

    let err = service
        .create_user("alice2", "alice@example.com", "hash")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::ConstraintViolation(_)));
    assert_eq!(err.http_status(), 403);

    let err = service
        .create_user("bad name", "x@example.com", "hash")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidRequest(_)));

    assert!(service.get_user("nobody").await.unwrap_err().is_not_found());

    Ok(())
}
