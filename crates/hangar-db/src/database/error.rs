//! Database error types.

use hangar_sql::storage::StorageError;
use thiserror::Error;

/// Database errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DatabaseError {
    /// The statement shape is not handled and the policy rejects it.
    #[error("unsupported statement: {reason} (sql: {sql})")]
    Unsupported {
        /// Statement text.
        sql: String,
        /// What was not handled.
        reason: String,
    },

    /// An insert duplicated a value of a UNIQUE column.
    #[error("constraint violation: {relation}.{column} already holds '{value}'")]
    ConstraintViolation {
        /// Relation name.
        relation: String,
        /// Column name.
        column: String,
        /// Duplicated value.
        value: String,
    },

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(StorageError),

    /// Transaction misuse (nested BEGIN, COMMIT without BEGIN, ...).
    #[error("transaction error: {0}")]
    Transaction(String),
}

impl DatabaseError {
    /// Returns true for [`DatabaseError::Unsupported`].
    pub fn is_unsupported(&self) -> bool {
        matches!(self, DatabaseError::Unsupported { .. })
    }
}

impl From<StorageError> for DatabaseError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::UniqueViolation {
                relation,
                column,
                value,
            } => DatabaseError::ConstraintViolation {
                relation,
                column,
                value,
            },
            other => DatabaseError::Storage(other),
        }
    }
}

/// Database result type.
pub type DatabaseResult<T> = Result<T, DatabaseError>;
