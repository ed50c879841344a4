use thiserror::Error;

use crate::domain::{AccountId, Currency};
use crate::storage::StoreError;

/// Which transaction boundary failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxPhase {
    Begin,
    Commit,
}

impl std::fmt::Display for TxPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxPhase::Begin => write!(f, "begin"),
            TxPhase::Commit => write!(f, "commit"),
        }
    }
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Account [{account_id}] currency mismatch, actual: {actual}, given: {given}")]
    CurrencyMismatch {
        account_id: AccountId,
        actual: Currency,
        given: Currency,
    },

    /// Pass-through store failure from inside a unit of work or a plain read.
    #[error(transparent)]
    Storage(StoreError),

    /// The transaction could not be opened or committed.
    #[error("Transaction {phase} failed: {source}")]
    Transaction {
        phase: TxPhase,
        #[source]
        source: StoreError,
    },

    /// The unit of work failed and so did the rollback.
    #[error("Tx err: {cause}, Rollback err: {rollback}")]
    Rollback {
        cause: Box<LedgerError>,
        rollback: StoreError,
    },

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) | StoreError::MissingReference(what) => {
                LedgerError::NotFound(what)
            }
            StoreError::ConstraintViolation(detail) => LedgerError::ConstraintViolation(detail),
            other => LedgerError::Storage(other),
        }
    }
}

impl LedgerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::NotFound(_))
    }

    /// Transactional failures that leave the request unrecoverable.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LedgerError::Transaction { .. } | LedgerError::Rollback { .. }
        )
    }

    /// Suggested HTTP status for a client-facing layer.
    pub fn http_status(&self) -> u16 {
        match self {
            LedgerError::NotFound(_) => 404,
            LedgerError::InvalidRequest(_) | LedgerError::CurrencyMismatch { .. } => 400,
            LedgerError::ConstraintViolation(_) => 403,
            LedgerError::Storage(_)
            | LedgerError::Transaction { .. }
            | LedgerError::Rollback { .. }
            | LedgerError::Database(_) => 500,
        }
    }
}
