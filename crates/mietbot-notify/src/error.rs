//! Notification error types.

use thiserror::Error;

/// Result type alias for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;

/// Errors raised while building or sending a notification mail.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// An address did not parse
    #[error("bad {role} address {address}: {reason}")]
    BadAddress {
        /// `from` or `to`
        role: &'static str,
        /// The offending address
        address: String,
        /// Parser message
        reason: String,
    },

    /// Message could not be assembled
    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    /// SMTP transport failure
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}
