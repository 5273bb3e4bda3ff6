//! # Machina Core
//!
//! Foundation types for the Machina chat-bot engine.
//!
//! This crate defines the vocabulary the rest of the workspace speaks:
//! inbound [`Event`] records, the closed [`ActionKind`] taxonomy, plugin
//! action declarations and their registered [`ActionMetadata`] form, boxed
//! async handlers with the [`Bindings`] argument record, invocation
//! identity, the error taxonomy, and the collaborator contracts the engine
//! consumes but never implements itself.
//!
//! ## Architecture
//!
//! Machina splits into three layers:
//!
//! - **Core** (this crate): shared types, no policy.
//! - **Engine** (`machina-engine`): the action registry, the mention
//!   grammar, the routing engine, and the execution fan-out.
//! - **Runtime** (`machina-runtime`): configuration, logging, the schedule
//!   driver, and process orchestration.
//!
//! Events flow one way through the engine:
//!
//! ```text
//! ┌───────────┐     ┌────────┐     ┌─────────┐     ┌──────────┐
//! │ transport │────▶│ router │────▶│ fan-out │────▶│ handlers │
//! └───────────┘     └────────┘     └─────────┘     └──────────┘
//!                        ▲               ▲
//!                   ┌────┴─────┐   ┌─────┴─────┐
//!                   │ registry │   │ schedule  │
//!                   │ catalogs │   │ re-entry  │
//!                   └──────────┘   └───────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use machina_core::{ActionDecl, Bindings, Event, handler_fn};
//!
//! let decl = ActionDecl::listen_to(
//!     "ping",
//!     r"^ping$",
//!     handler_fn(|ctx| async move {
//!         println!("ping from {:?}", ctx.channel());
//!     }),
//! );
//!
//! let event = Event::message("C1", "ping");
//! assert!(event.is_message());
//! ```

pub mod action;
pub mod error;
pub mod event;
pub mod handler;
pub mod help;
pub mod invocation;
pub mod responder;
pub mod schedule;
pub mod settings;

pub use action::{ActionDecl, ActionHelp, ActionKind, ActionMetadata};
pub use error::{
    HandlerError, HandlerFailure, MalformedEvent, RegistrationError, RegistrationResult,
    ScheduleError, StoreError,
};
pub use event::{DestinationKind, Event};
pub use handler::{ActionContext, Bindings, HandlerFn, IntoHandlerResult, bind, handler_fn};
pub use help::{HelpIndex, HelpStore, MemoryHelpStore, OrderedMap};
pub use invocation::{Invocation, InvocationId, InvocationSource};
pub use responder::{BoxedResponder, Responder, SendError};
pub use schedule::{ScheduledJob, Scheduler, Trigger};
pub use settings::Settings;

/// Prelude for common imports.
pub mod prelude {
    pub use super::action::{ActionDecl, ActionHelp, ActionKind, ActionMetadata};
    pub use super::event::{DestinationKind, Event};
    pub use super::handler::{ActionContext, Bindings, HandlerFn, bind, handler_fn};
    pub use super::invocation::{Invocation, InvocationId, InvocationSource};
    pub use super::responder::{BoxedResponder, Responder};
    pub use super::schedule::Trigger;
    pub use super::settings::Settings;
}
