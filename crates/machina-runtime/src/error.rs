//! Runtime error types.

use thiserror::Error;

use crate::config::ConfigError;
use machina_core::{RegistrationError, ScheduleError, StoreError};

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration loading or validation failed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The mention grammar could not be built from the bot identity.
    #[error("Failed to compile mention grammar: {0}")]
    Grammar(#[from] regex::Error),

    /// A late action registration was rejected.
    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// A job could not be handed to the scheduler.
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// The help index could not be persisted.
    #[error("Help store error: {0}")]
    HelpStore(#[from] StoreError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
