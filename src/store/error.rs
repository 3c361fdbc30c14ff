//! Store Errors

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the durable record store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No live record under the key
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Unique key already taken
    #[error("{entity} already exists: {key}")]
    Duplicate { entity: &'static str, key: String },

    /// Applying a delta would push the balance out of range
    #[error("balance overflow on account {account_number}")]
    BalanceOverflow { account_number: String },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn duplicate(entity: &'static str, key: impl Into<String>) -> Self {
        Self::Duplicate {
            entity,
            key: key.into(),
        }
    }

    /// Check if this error signals a missing record
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Check if this error signals a unique-key collision
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate { .. })
    }

    /// Map a balance UPDATE failure, turning numeric overflow into
    /// `BalanceOverflow`
    pub(crate) fn from_balance_update(err: sqlx::Error, account_number: &str) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(NUMERIC_OVERFLOW) {
                return Self::BalanceOverflow {
                    account_number: account_number.to_string(),
                };
            }
        }
        Self::Database(err)
    }

    /// Map an INSERT failure, turning unique violations into `Duplicate`
    pub(crate) fn from_insert(err: sqlx::Error, entity: &'static str, key: &str) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                return Self::duplicate(entity, key);
            }
        }
        Self::Database(err)
    }
}

/// PostgreSQL SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL SQLSTATE for numeric_value_out_of_range
const NUMERIC_OVERFLOW: &str = "22003";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::not_found("account", "01000001");
        assert_eq!(err.to_string(), "account not found: 01000001");
        assert!(err.is_not_found());
        assert!(!err.is_duplicate());

        let err = StoreError::duplicate("user", "usr-1");
        assert!(err.to_string().contains("already exists"));
        assert!(err.is_duplicate());
    }

    #[test]
    fn test_from_insert_passes_through_other_errors() {
        let err = StoreError::from_insert(sqlx::Error::RowNotFound, "account", "01000001");
        assert!(matches!(err, StoreError::Database(_)));
    }
}
