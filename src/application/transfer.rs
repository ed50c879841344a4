use tracing::{debug, info, instrument};

use crate::domain::{TransferOutcome, TransferParams};
use crate::storage::{LedgerStore, LedgerTx};

use super::{LedgerError, TransactionManager, apply_ordered, canonical_order};

/// Moves money between two accounts as one unit of work.
#[derive(Clone)]
pub struct TransferExecutor<S> {
    tx_manager: TransactionManager<S>,
}

impl<S: LedgerStore> TransferExecutor<S> {
    pub fn new(store: S) -> Self {
        Self {
            tx_manager: TransactionManager::new(store),
        }
    }

    pub fn store(&self) -> &S {
        self.tx_manager.store()
    }

    /// Transfer `amount` from one account to another.
    ///
    /// Creates the transfer record and its debit and credit entries, then updates
    /// both balances in ascending account order. Any failure rolls back all of it.
    /// The caller is responsible for validating the amount and currencies.
    #[instrument(
        skip_all,
        fields(
            from = params.from_account_id,
            to = params.to_account_id,
            amount = %params.amount
        )
    )]
    pub async fn transfer(&self, params: TransferParams) -> Result<TransferOutcome, LedgerError> {
        let TransferParams {
            from_account_id,
            to_account_id,
            amount,
        } = params;

        let outcome = self
            .tx_manager
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    let transfer = tx
                        .create_transfer(from_account_id, to_account_id, amount)
                        .await?;
                    let from_entry = tx.create_entry(from_account_id, -amount).await?;
                    let to_entry = tx.create_entry(to_account_id, amount).await?;

                    let (lower, higher, swapped) =
                        canonical_order(from_account_id, to_account_id, amount);
                    debug!(
                        first = lower.account_id,
                        second = higher.account_id,
                        "Applying balance updates"
                    );
                    let (lower_account, higher_account) =
                        apply_ordered(tx, lower, higher).await?;

                    let (from_account, to_account) = if swapped {
                        (higher_account, lower_account)
                    } else {
                        (lower_account, higher_account)
                    };

                    Ok::<_, LedgerError>(TransferOutcome {
                        transfer,
                        from_entry,
                        to_entry,
                        from_account,
                        to_account,
                    })
                })
            })
            .await?;

        info!(transfer_id = outcome.transfer.id, "Transfer committed");
        Ok(outcome)
    }
}
