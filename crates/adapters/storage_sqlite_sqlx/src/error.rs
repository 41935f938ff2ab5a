//! Storage-specific error type wrapping sqlx errors.

use soundboard_domain::error::SoundboardError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// A trigger, condition or action list could not be (de)serialized.
    #[error("JSON encoding error")]
    Json(#[from] serde_json::Error),

    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<StorageError> for SoundboardError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
