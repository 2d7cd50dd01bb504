//! Error types for watchsync.
//!
//! Only failures that abort a whole run live here. Problems with a single
//! row are reported through [`crate::row::SkipReason`] instead.

use thiserror::Error;

/// Errors that abort an ingest or sync run.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Watermark error: {0}")]
    Watermark(String),

    #[error("Access token request failed: {0}")]
    Auth(String),

    #[error("Calendar API error: {0}")]
    Calendar(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for watchsync operations.
pub type SyncResult<T> = Result<T, SyncError>;
