//! Core error types for mietbot.
//!
//! Configuration and profile errors live here because every other crate
//! consumes them; subsystem crates define their own error enums.

use thiserror::Error;

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Config file not found at an explicitly requested path
    #[error("config file not found at {path}")]
    NotFound {
        /// Path where config was expected
        path: String,
    },

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// I/O error reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Errors raised while loading or validating an applicant profile.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// Profile file not found
    #[error("profile not found at {path}")]
    NotFound {
        /// Path where the profile was expected
        path: String,
    },

    /// I/O error reading/writing the profile
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Profile document is not valid JSON
    #[error("failed to parse profile JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Profile is structurally valid but unusable
    #[error("invalid profile: {field}: {reason}")]
    Invalid {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for profile operations.
pub type ProfileResult<T> = std::result::Result<T, ProfileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::NoConfigDir;
        assert_eq!(
            err.to_string(),
            "could not determine config directory (XDG base directories not available)"
        );

        let err = ProfileError::Invalid {
            field: "emails".to_string(),
            reason: "at least one recipient email is required".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid profile: emails: at least one recipient email is required"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let profile_err: ProfileError = io_err.into();
        assert!(matches!(profile_err, ProfileError::Io(_)));
    }
}
