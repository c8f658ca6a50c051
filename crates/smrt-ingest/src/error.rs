//! Error types for SMRT ingestion

use thiserror::Error;

use crate::envelope::EnvelopeError;

/// Result type for ingest operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Error types for SMRT ingestion
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid envelope: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("Configuration error: {0}. Check SMRT_* environment variables and CLI flags.")]
    Config(String),
}

impl IngestError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True when the error describes the file's content rather than the
    /// environment, i.e. the file belongs in quarantine.
    pub fn is_malformed_input(&self) -> bool {
        match self {
            IngestError::Envelope(_) => true,
            IngestError::Csv(err) => !matches!(err.kind(), csv::ErrorKind::Io(_)),
            _ => false,
        }
    }
}
