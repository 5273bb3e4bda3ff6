//! Engine error taxonomy.
//!
//! Four conditions cover everything that can go wrong between a plugin
//! declaring an action and a handler finishing:
//!
//! - [`RegistrationError`] — a plugin could not be registered, either
//!   because required configuration is absent (the whole plugin is skipped,
//!   recoverable) or because a declared pattern does not compile (that one
//!   action is skipped).
//! - [`MalformedEvent`] — directedness had to be computed for an event that
//!   carries no destination; fatal to that single event only.
//! - [`HandlerFailure`] — one invocation errored or panicked; isolated from
//!   its siblings and from the receive loop.
//!
//! Nothing here terminates the process. Startup-time unrecoverable
//! conditions live in the runtime crate's error types.

use thiserror::Error;

/// Opaque error type handlers are allowed to return.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while registering a plugin's actions.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The owning plugin declared settings that are not configured. The
    /// plugin is skipped in its entirety; no partial registration happens.
    #[error("plugin {plugin} is missing required configuration: {}", keys.join(", "))]
    MissingConfiguration {
        /// The plugin that declared the settings.
        plugin: String,
        /// Every declared key absent from the active configuration.
        keys: Vec<String>,
    },

    /// A declared text pattern does not compile. Fails this single
    /// registration, not the whole registry build.
    #[error("invalid pattern for action {action}")]
    PatternCompile {
        /// Stable key of the action whose pattern failed.
        action: String,
        #[source]
        source: regex::Error,
    },
}

/// Result alias for registration operations.
pub type RegistrationResult<T> = Result<T, RegistrationError>;

/// An event on which directedness cannot be computed.
///
/// Message routing needs a destination identifier; an event that reaches
/// the message-routing step without one is a defect in the feed and fails
/// fast — for that event only. The engine keeps processing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed {event_type:?} event: missing channel, directedness cannot be computed")]
pub struct MalformedEvent {
    /// Type of the offending event.
    pub event_type: String,
}

/// Why a single handler invocation did not complete.
#[derive(Debug, Error)]
pub enum HandlerFailure {
    /// The handler returned an error.
    #[error("handler error: {0}")]
    Error(HandlerError),

    /// The handler panicked; the panic was contained to its own task.
    #[error("handler panicked: {0}")]
    Panicked(String),
}

/// Errors raised by the scheduler collaborator.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// The trigger's cron expression does not parse.
    #[error("invalid cron expression {expr:?}: {detail}")]
    InvalidCron {
        /// The expression as declared.
        expr: String,
        /// Parser diagnostic.
        detail: String,
    },

    /// The scheduler is shutting down and no longer accepts jobs.
    #[error("scheduler is no longer accepting jobs")]
    Closed,
}

/// Errors raised by the help persistence collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The help index could not be serialized.
    #[error("help index serialization failed: {0}")]
    Serialization(String),

    /// The backing store reported an error.
    #[error("help store backend error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_configuration_lists_all_keys() {
        let err = RegistrationError::MissingConfiguration {
            plugin: "weather".to_string(),
            keys: vec!["api_key".to_string(), "units".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "plugin weather is missing required configuration: api_key, units"
        );
    }

    #[test]
    fn pattern_compile_carries_source() {
        let source = regex::Regex::new("(unclosed").unwrap_err();
        let err = RegistrationError::PatternCompile {
            action: "echo.repeat".to_string(),
            source,
        };
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn malformed_event_names_the_type() {
        let err = MalformedEvent {
            event_type: "message".to_string(),
        };
        assert!(err.to_string().contains("\"message\""));
    }
}
