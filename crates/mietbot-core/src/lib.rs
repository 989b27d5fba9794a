//! Mietbot Core - Foundation crate for the mietbot housing-application bot.
//!
//! This crate provides the configuration object, the user profile document,
//! and the shared error types that all other mietbot crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`profile`] - Applicant profile (recipients, criteria, form fields)
//!
//! # Example
//!
//! ```rust
//! use mietbot_core::AppConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! assert!(config.browser.headless);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod profile;

// Re-export commonly used types
pub use config::{
    AppConfig, BrowserSection, CrawlerSection, NotifySection, RemoteSection, StoreSection,
};
pub use error::{ConfigError, ConfigResult, ProfileError, ProfileResult};
pub use profile::UserProfile;
