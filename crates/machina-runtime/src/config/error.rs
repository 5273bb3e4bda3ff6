//! Configuration error taxonomy.
//!
//! Everything here is startup-phase: a configuration that fails to load or
//! validate stops the runtime before any event is accepted.

use std::path::PathBuf;
use thiserror::Error;

/// Why the configuration could not be loaded or is unusable.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly named configuration file does not exist.
    #[error("configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// A configuration file exists but could not be read.
    #[error("configuration file unreadable: {0}")]
    ReadError(#[from] std::io::Error),

    /// A source parsed but did not produce a valid configuration.
    #[error("configuration did not parse: {0}")]
    ParseError(String),

    /// A cross-field validation rule failed.
    #[error("invalid configuration: {message}")]
    ValidationError { message: String },

    /// A field the runtime cannot start without is empty or absent.
    #[error("required configuration field is missing: {field}")]
    MissingField { field: String },
}

impl ConfigError {
    /// Validation failure with `message`.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    /// Missing-field failure naming `field`.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
