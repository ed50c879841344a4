use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Account, AccountId, Currency, Entry};

pub type TransferId = i64;

/// A transfer records one movement of money between two accounts.
/// Transfers are immutable; each one is paired with a debit and a credit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: TransferId,
    /// Source account (balance decreases)
    pub from_account_id: AccountId,
    /// Destination account (balance increases)
    pub to_account_id: AccountId,
    /// Always positive
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Input of the transfer transaction. `amount > 0` and account existence are
/// checked upstream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransferParams {
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub amount: Decimal,
}

/// Snapshot returned by a committed transfer, with post-transfer balances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub transfer: Transfer,
    pub from_entry: Entry,
    pub to_entry: Entry,
    pub from_account: Account,
    pub to_account: Account,
}

/// Transfer request as received from a client, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub amount: Decimal,
    pub currency: Currency,
}

impl From<&TransferRequest> for TransferParams {
    fn from(req: &TransferRequest) -> Self {
        Self {
            from_account_id: req.from_account_id,
            to_account_id: req.to_account_id,
            amount: req.amount,
        }
    }
}
