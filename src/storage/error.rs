use thiserror::Error;

/// Failures reported by a ledger store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Row not found: {0}")]
    NotFound(String),

    /// A foreign key pointed at a row that does not exist.
    #[error("Missing referenced row: {0}")]
    MissingReference(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Corrupt row: {0}")]
    Decode(String),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => StoreError::NotFound("no matching row".to_string()),
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                StoreError::MissingReference(db.message().to_string())
            }
            sqlx::Error::Database(db) if db.is_unique_violation() || db.is_check_violation() => {
                StoreError::ConstraintViolation(db.message().to_string())
            }
            _ => StoreError::Database(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_other_errors_pass_through() {
        let err = StoreError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Database(sqlx::Error::PoolTimedOut)));
    }
}
