//! Error types shared by the store, importer and query layers

use thiserror::Error;

/// Result alias for library operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised below the presentation layer
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite operation failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Feed download failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// CSV decoding or encoding failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A required header is absent from the feed
    #[error("Feed is missing required column '{0}'")]
    MissingColumn(String),

    /// A numeric cell could not be parsed
    #[error("Invalid number {value:?} in column '{column}' at line {line}")]
    InvalidNumber {
        line: u64,
        column: String,
        value: String,
    },

    /// Quartile token outside Q1..Q4 and "-"
    #[error("Invalid quartile: {0}")]
    InvalidQuartile(String),

    /// No journal carries the requested identifier
    #[error("Journal not found: {0}")]
    JournalNotFound(i64),

    /// Configuration loading or validation failed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Check whether this is a missing-journal condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::JournalNotFound(_))
    }
}
