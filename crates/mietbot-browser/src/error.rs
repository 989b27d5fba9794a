//! Browser driver error types.

use thiserror::Error;

/// Result type alias for browser operations.
pub type Result<T> = std::result::Result<T, BrowserError>;

/// Errors raised by the browser engine and the catalog driver.
#[derive(Error, Debug)]
pub enum BrowserError {
    /// The Chromium process or CDP connection failed
    #[error("chromium error: {0}")]
    Chromium(String),

    /// Navigation failed or produced no usable page
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// An expected element is missing from the page
    #[error("selector not found: {0}")]
    SelectorNotFound(String),

    /// In-page script evaluation failed
    #[error("script evaluation failed: {0}")]
    Evaluation(String),

    /// A listing row index no longer exists on the live page
    #[error("listing index {index} out of range, page has {available} rows")]
    StaleListingIndex {
        /// The requested row index
        index: usize,
        /// Rows currently on the page
        available: usize,
    },

    /// Snapshot or download I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Exposé download failure
    #[error("download failed: {0}")]
    Download(#[from] reqwest::Error),
}

impl BrowserError {
    /// Wrap a CDP-level failure.
    pub fn cdp(error: impl std::fmt::Display) -> Self {
        Self::Chromium(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BrowserError::SelectorNotFound(".cm-btn".to_string());
        assert_eq!(err.to_string(), "selector not found: .cm-btn");

        let err = BrowserError::StaleListingIndex {
            index: 7,
            available: 3,
        };
        assert!(err.to_string().contains("index 7"));
        assert!(err.to_string().contains("3 rows"));
    }
}
