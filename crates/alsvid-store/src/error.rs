//! Error handling for the persistence layer.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Snapshot not found in the store.
    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(i64),

    /// Entity not found in the store.
    #[error("Entity not found: {0}")]
    EntityNotFound(i64),

    /// JSON serialization/deserialization error for row payloads.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Model decode error (bad kind or reference field name in a row).
    #[error("Model error: {0}")]
    Model(#[from] alsvid_model::ModelError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::SnapshotNotFound(17);
        assert_eq!(err.to_string(), "Snapshot not found: 17");

        let err = StoreError::Database("locked".to_string());
        assert_eq!(err.to_string(), "Database error: locked");
    }
}
