//! Custom error types for zotero-bib.
//!
//! All library functions return `Result<T, BibError>`. Every error is terminal
//! for the operation that produced it; nothing is retried or swallowed.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for zotero-bib operations.
#[derive(Debug, Error)]
pub enum BibError {
    /// Transport-level failure talking to the Zotero API
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The Zotero API answered with a non-success status
    #[error("HTTP error: {status} for {url}")]
    Http {
        /// Status code returned by the API
        status: u16,
        /// Request URL (without credentials)
        url: String,
    },

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error (missing keys, unreadable config file)
    #[error("Config error: {0}")]
    Config(String),

    /// Invalid arguments
    #[error("Validation error: {0}")]
    Validation(String),

    /// Remote search was called without any filter
    #[error("Provide at least one filter: author, year, year_range, journal, or title_words.")]
    MissingFilter,

    /// A BibTeX database could not be parsed
    #[error("BibTeX parse error in {path:?}: {reason}")]
    BibtexParse { path: PathBuf, reason: String },

    /// CSV data file does not exist
    #[error("Data file not found: {}", .0.display())]
    DataNotFound(PathBuf),

    /// CSV data file exists but could not be loaded
    #[error("Error loading {}: {reason}", .path.display())]
    DataLoad { path: PathBuf, reason: String },
}

impl From<::config::ConfigError> for BibError {
    fn from(err: ::config::ConfigError) -> Self {
        BibError::Config(err.to_string())
    }
}

/// Result type alias using `BibError`
pub type Result<T> = std::result::Result<T, BibError>;
