//! Store error types.

use thiserror::Error;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised by ledger and profile store backends.
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O failure against a file-backed store
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A store document is not valid JSON
    #[error("store document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport failure against the remote document store
    #[error("remote store request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote document store rejected a request
    #[error("remote store returned {status} for {operation}: {message}")]
    Remote {
        /// HTTP status code
        status: u16,
        /// The operation that failed (e.g. "get document")
        operation: String,
        /// Response body or reason phrase
        message: String,
    },

    /// A requested document does not exist
    #[error("document not found: {key}")]
    NotFound {
        /// The requested document key
        key: String,
    },

    /// A remote document exists but cannot be read back into its type
    #[error("malformed document {key}: {reason}")]
    MalformedDocument {
        /// The offending document key
        key: String,
        /// What was wrong with it
        reason: String,
    },

    /// Required connection parameter missing from configuration
    #[error("missing remote store parameter: {field}")]
    MissingParameter {
        /// The absent config field
        field: &'static str,
    },

    /// Store configuration value unusable
    #[error("invalid store configuration: {field}: {reason}")]
    InvalidConfig {
        /// The offending config field
        field: &'static str,
        /// What was wrong with it
        reason: String,
    },

    /// Credential file unusable
    #[error("credential file {path}: {reason}")]
    Credentials {
        /// Path to the credential file
        path: String,
        /// What was wrong with it
        reason: String,
    },

    /// Profile document failed validation after loading
    #[error(transparent)]
    Profile(#[from] mietbot_core::ProfileError),
}
