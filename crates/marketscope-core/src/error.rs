//! Error types for the Marketscope store.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    DocumentNotFound(i64),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Analysis provider error: {0}")]
    ProviderError(String),

    #[error("No armed wipe for scope: {0}")]
    NotArmed(String),

    #[error("Armed wipe expired for scope: {0}")]
    ConfirmExpired(String),

    #[error("Database error: {0}")]
    DatabaseError(rusqlite::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

// Constraint failures (foreign keys, unique indexes) get their own variant
// so callers can tell a rejected write from a broken database file.
impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, msg)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                let detail = msg.clone().unwrap_or_else(|| e.to_string());
                StoreError::ConstraintViolation(detail)
            }
            _ => StoreError::DatabaseError(err),
        }
    }
}
