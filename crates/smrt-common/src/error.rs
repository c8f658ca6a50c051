//! Error types shared across the SMRT workspace

use thiserror::Error;

/// Result type alias for shared SMRT operations
pub type Result<T> = std::result::Result<T, SmrtError>;

/// Shared error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SmrtError {
    #[error("Invalid date '{0}': expected an 8-digit YYYYMMDD calendar date")]
    InvalidDate(String),

    #[error("Invalid time '{0}': expected a 6-digit HHMMSS time of day")]
    InvalidTime(String),
}
