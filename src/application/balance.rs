use rust_decimal::Decimal;

use crate::domain::{Account, AccountId};
use crate::storage::LedgerTx;

use super::LedgerError;

/// A signed change to one account balance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceDelta {
    pub account_id: AccountId,
    pub delta: Decimal,
}

impl BalanceDelta {
    pub fn new(account_id: AccountId, delta: Decimal) -> Self {
        Self { account_id, delta }
    }
}

/// Map the debit and credit sides of a transfer onto ascending account order.
///
/// Returns `(lower, higher, swapped)`; `swapped` is true when the destination
/// account sorts first. Equal ids (a self-transfer) keep the destination first.
pub fn canonical_order(
    from_account_id: AccountId,
    to_account_id: AccountId,
    amount: Decimal,
) -> (BalanceDelta, BalanceDelta, bool) {
    let debit = BalanceDelta::new(from_account_id, -amount);
    let credit = BalanceDelta::new(to_account_id, amount);

    if from_account_id < to_account_id {
        (debit, credit, false)
    } else {
        (credit, debit, true)
    }
}

/// Apply two balance deltas, lower account id first.
///
/// Every transaction touching a pair of accounts takes their row locks in the same
/// order, so two transfers in opposite directions can never wait on each other in
/// a cycle. Each change is one atomic increment, never a read followed by a write.
pub async fn apply_ordered<T: LedgerTx>(
    tx: &mut T,
    lower: BalanceDelta,
    higher: BalanceDelta,
) -> Result<(Account, Account), LedgerError> {
    debug_assert!(
        lower.account_id <= higher.account_id,
        "balance deltas must be applied in ascending account order"
    );

    let lower_account = tx
        .add_account_balance(lower.account_id, lower.delta)
        .await?;
    let higher_account = tx
        .add_account_balance(higher.account_id, higher.delta)
        .await?;

    Ok((lower_account, higher_account))
}
