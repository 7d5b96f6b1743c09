//! Storage error types.

use std::fmt;

/// Storage error type.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    /// An insert would duplicate a value in a column declared UNIQUE.
    UniqueViolation {
        /// Relation name.
        relation: String,
        /// Column name.
        column: String,
        /// Duplicated value, rendered as text.
        value: String,
    },
    /// The identity counter of a relation cannot advance.
    IdentityOverflow(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::UniqueViolation {
                relation,
                column,
                value,
            } => write!(
                f,
                "Unique constraint failed: {}.{} (value '{}')",
                relation, column, value
            ),
            StorageError::IdentityOverflow(relation) => {
                write!(f, "Identity counter exhausted for table: {}", relation)
            }
        }
    }
}

impl std::error::Error for StorageError {}

/// Storage result type.
pub type StorageResult<T> = Result<T, StorageError>;
