//! Configuration module for the Machina runtime.
//!
//! This module provides layered configuration loading (files, environment,
//! programmatic overrides) and validation for the bot identity, logging
//! setup, and plugin settings.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    BotConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, MachinaConfig, SpanEventConfig,
};
pub use validation::validate_config;
