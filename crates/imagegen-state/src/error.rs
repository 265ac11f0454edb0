//! Error types for imagegen-state

use thiserror::Error;

/// Errors raised while connecting to or preparing the database
#[derive(Error, Debug)]
pub enum StateError {
    /// Database connection error
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Database query error
    #[error("Database query failed: {0}")]
    Query(String),

    /// Serialization error
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Schema setup error
    #[error("Schema setup failed: {0}")]
    SchemaSetup(String),
}

impl From<surrealdb::Error> for StateError {
    fn from(err: surrealdb::Error) -> Self {
        StateError::Query(err.to_string())
    }
}

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> Self {
        StateError::Serialization(err.to_string())
    }
}

/// Errors raised by [`crate::AuditLog`] operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Underlying backend failure (connection dropped, query rejected, ...)
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored row could not be mapped back into an audit record
    #[error("corrupt audit row {id}: {reason}")]
    CorruptRecord { id: String, reason: String },

    /// The record violates the audit invariants and was not written
    #[error("invalid audit record: {0}")]
    InvalidRecord(String),
}

impl From<StateError> for StorageError {
    fn from(err: StateError) -> Self {
        StorageError::Backend(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_error_converts_to_backend_storage_error() {
        let err: StorageError = StateError::Connection("refused".to_string()).into();
        assert!(matches!(err, StorageError::Backend(_)));
        assert!(err.to_string().contains("refused"));
    }

    #[test]
    fn corrupt_record_display_names_the_row() {
        let err = StorageError::CorruptRecord {
            id: "abc".to_string(),
            reason: "unknown status".to_string(),
        };
        assert_eq!(err.to_string(), "corrupt audit row abc: unknown status");
    }
}
