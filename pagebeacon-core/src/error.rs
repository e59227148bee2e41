//! Error types for pagebeacon-core

use thiserror::Error;

/// Main error type for the pagebeacon-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Event sink (SQLite) error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Beacon delivery error
    #[error("delivery error: {0}")]
    Delivery(String),
}

/// Result type alias for pagebeacon-core
pub type Result<T> = std::result::Result<T, Error>;

/// Why a single log line could not be turned into a payload.
///
/// These are per-line outcomes collected into an import report, never
/// propagated as a batch failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    /// No `{ ... }` span in the line
    #[error("malformed line: no JSON object found")]
    MalformedLine,

    /// A `{ ... }` span was found but did not decode to a JSON object
    #[error("invalid JSON: {message}")]
    InvalidJson { message: String },
}
