use futures::future::BoxFuture;
use tracing::{debug, error};

use crate::storage::{LedgerStore, LedgerTx};

use super::{LedgerError, TxPhase};

/// Lifecycle of one storage transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Started,
    Active,
    Committed,
    RolledBack,
    Failed,
}

impl TxState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TxState::Committed | TxState::RolledBack | TxState::Failed
        )
    }
}

/// Runs units of work inside single all-or-nothing storage transactions.
#[derive(Clone)]
pub struct TransactionManager<S> {
    store: S,
}

impl<S: LedgerStore> TransactionManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Execute `unit_of_work` within one transaction.
    ///
    /// All writes must go through the transactional view handed to the closure.
    /// On failure the transaction is rolled back and the original error returned;
    /// if the rollback fails too, both errors are returned as `LedgerError::Rollback`.
    /// Nothing is retried.
    pub async fn run_in_transaction<T, F>(&self, unit_of_work: F) -> Result<T, LedgerError>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut S::Tx) -> BoxFuture<'t, Result<T, LedgerError>> + Send,
    {
        let mut state = TxState::Started;
        let mut tx = self
            .store
            .begin()
            .await
            .map_err(|source| LedgerError::Transaction {
                phase: TxPhase::Begin,
                source,
            })?;
        transition(&mut state, TxState::Active);

        match unit_of_work(&mut tx).await {
            Ok(value) => match tx.commit().await {
                Ok(()) => {
                    transition(&mut state, TxState::Committed);
                    Ok(value)
                }
                Err(source) => {
                    transition(&mut state, TxState::Failed);
                    Err(LedgerError::Transaction {
                        phase: TxPhase::Commit,
                        source,
                    })
                }
            },
            Err(cause) => match tx.rollback().await {
                Ok(()) => {
                    transition(&mut state, TxState::RolledBack);
                    Err(cause)
                }
                Err(rollback) => {
                    transition(&mut state, TxState::Failed);
                    error!(error = %cause, rollback_error = %rollback, "Rollback failed");
                    Err(LedgerError::Rollback {
                        cause: Box::new(cause),
                        rollback,
                    })
                }
            },
        }
    }
}

fn transition(state: &mut TxState, next: TxState) {
    debug_assert!(!state.is_terminal(), "transaction already finished");
    debug!(from = ?*state, to = ?next, "Transaction state change");
    *state = next;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!TxState::Started.is_terminal());
        assert!(!TxState::Active.is_terminal());
        assert!(TxState::Committed.is_terminal());
        assert!(TxState::RolledBack.is_terminal());
        assert!(TxState::Failed.is_terminal());
    }

    #[test]
    fn test_transition_updates_state() {
        let mut state = TxState::Started;
        transition(&mut state, TxState::Active);
        transition(&mut state, TxState::Committed);
        assert_eq!(state, TxState::Committed);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "transaction already finished")]
    fn test_no_transition_out_of_terminal_state() {
        let mut state = TxState::RolledBack;
        transition(&mut state, TxState::Active);
    }
}
