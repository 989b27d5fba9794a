//! Crawler error types.

use thiserror::Error;

/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Errors that abort a crawl session.
///
/// In continuous mode the session runner catches these, tears the browser
/// down and recreates everything after a backoff; in single-pass mode they
/// propagate out of the process.
#[derive(Error, Debug)]
pub enum CrawlerError {
    /// Browser or catalog driver failure
    #[error(transparent)]
    Browser(#[from] mietbot_browser::BrowserError),

    /// Ledger or profile store failure
    #[error(transparent)]
    Store(#[from] mietbot_store::StoreError),

    /// No network reachability in single-pass mode
    #[error("no internet connectivity")]
    Offline,
}
