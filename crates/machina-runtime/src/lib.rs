//! Machina Runtime - Orchestration layer for the Machina bot framework.
//!
//! This crate provides:
//! - Configuration loading and validation (`ConfigLoader`, `MachinaConfig`)
//! - Logging configuration (`LoggingBuilder`)
//! - The cron schedule driver (`CronScheduler`)
//! - Runtime orchestration (`MachinaRuntime`)
//!
//! # Configuration Sources
//!
//! Configuration is layered: defaults, then configuration files found on
//! the search paths, then `MACHINA_*` environment variables. TOML files
//! are supported by default; YAML support is behind the `yaml-config`
//! feature.
//!
//! ```ignore
//! use std::sync::Arc;
//! use machina_runtime::MachinaRuntime;
//!
//! #[tokio::main]
//! async fn main() -> machina_runtime::RuntimeResult<()> {
//!     // Loads machina.toml, initializes logging, registers plugins
//!     let runtime = MachinaRuntime::builder()
//!         .plugin(Arc::new(MyPlugin::default()))
//!         .build()
//!         .await?;
//!
//!     // Feed deserialized events in from your chat backend
//!     let events = runtime.sender();
//!
//!     // Run until Ctrl+C
//!     runtime.run().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Scheduled Actions
//!
//! Plugins that declare schedule actions need no extra wiring: the
//! builder books each of them with the [`CronScheduler`], which fires
//! them through the same dispatch pipeline live events use.

pub mod config;
pub mod error;
pub mod logging;
pub mod responder;
pub mod runtime;
pub mod scheduler;

// Re-exports
pub use config::{
    BotConfig, ConfigError, ConfigLoader, ConfigResult, LoggingConfig, MachinaConfig, Profile,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use responder::TracingResponder;
pub use runtime::{EventSender, MachinaRuntime, RuntimeBuilder};
pub use scheduler::CronScheduler;

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
