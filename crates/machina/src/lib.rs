//! # Machina
//!
//! A plugin-driven, failure-isolated chat-bot framework for Rust.
//!
//! ## Overview
//!
//! Machina turns a stream of chat events into concurrent handler runs.
//! Plugins declare what they react to; the engine decides what runs for
//! each event; the runtime owns configuration, logging, scheduling, and
//! the event loop. A misbehaving handler affects nothing but itself.
//!
//! ## Architecture
//!
//! Machina routes every event through the same pipeline:
//!
//! ```text
//! ┌─────────────┐     ┌────────┐     ┌──────────────────────────────────────┐
//! │   Runtime   │────▶│ Router │────▶│ Handler "ping"  (own task, isolated) │──▶ responder
//! │ (event pump)│     │        │────▶│ Handler "hello" (own task, isolated) │──▶ responder
//! └─────────────┘     └────────┘────▶│ Handler ...     (own task, isolated) │──▶ responder
//!                                    └──────────────────────────────────────┘
//! ```
//!
//! - **Runtime**: Loads configuration, registers plugins, pumps events
//! - **Router**: Plans each event against the registered action catalogs
//! - **Handlers**: User-defined async functions, one task per invocation
//! - **Responder**: Your chat backend's outgoing-message implementation
//!
//! Directed messages (a mention of the bot, or any message in a direct
//! conversation) go to `respond_to` actions; everything else overheard
//! goes to `listen_to` actions. Never both.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use machina::prelude::*;
//!
//! struct Deploy;
//!
//! impl Plugin for Deploy {
//!     fn info(&self) -> PluginInfo {
//!         PluginInfo::new("deploy").with_summary("Deployments")
//!     }
//!
//!     fn actions(self: Arc<Self>) -> Vec<ActionDecl> {
//!         vec![
//!             ActionDecl::respond_to(
//!                 "ship",
//!                 r"^deploy (?P<service>\w+)$",
//!                 handler_fn(|ctx| async move {
//!                     println!("deploying {:?}", ctx.arg("service"));
//!                 }),
//!             )
//!             .with_help("deploy <service>", "Ship a service to production"),
//!         ]
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> RuntimeResult<()> {
//!     let runtime = MachinaRuntime::builder()
//!         .plugin(Arc::new(Deploy))
//!         .build()
//!         .await?;
//!
//!     // Feed events from your chat backend through runtime.sender()
//!     runtime.run().await
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON-formatted log output

pub use machina_core as core;
pub use machina_engine as engine;
pub use machina_runtime as runtime;

/// Prelude module for convenient imports.
///
/// This module provides all commonly used types for building bot
/// applications:
///
/// ```rust,ignore
/// use machina::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use machina_runtime::{MachinaRuntime, RuntimeBuilder, RuntimeResult};

    // Plugin system - primary unit of bot functionality
    pub use machina_engine::{Plugin, PluginInfo};

    // Action declarations - what a plugin reacts to
    pub use machina_core::{ActionDecl, ActionHelp, ActionKind, Trigger};

    // Handler building
    pub use machina_core::{ActionContext, Bindings, HandlerError, bind, handler_fn};

    // Event system - for inspecting what handlers received
    pub use machina_core::{DestinationKind, Event};

    // Collaborator contracts - for custom chat backends
    pub use machina_core::{BoxedResponder, HelpStore, Responder, SendError};
}
