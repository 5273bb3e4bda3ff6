//! Event routing and action dispatch for Machina.
//!
//! This crate is the middle layer of the framework: it takes the types
//! from `machina-core` and turns them into a working engine. An event
//! flows through three stages, each owned by one module here:
//!
//! 1. [`registry`] — plugins are loaded once at startup and their actions
//!    land in per-kind catalogs.
//! 2. [`router`] — each inbound event is planned against the catalogs
//!    into a batch of invocations, with mention detection deciding
//!    between the listen and respond paths.
//! 3. [`fanout`] — the batch runs concurrently, one task per invocation,
//!    and failures are contained and reported per handler.
//!
//! Scheduled work re-enters the same pipeline through
//! [`schedule::ScheduleAdapter`], so timer firings get the same isolation
//! guarantees as live events.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut loader = PluginLoader::new(Arc::new(settings));
//! loader.load(Arc::new(PingPong::new(responder))).await;
//! let (registry, report) = loader.finish();
//!
//! let grammar = MentionGrammar::new(identity)?;
//! let router = Router::new(Arc::new(registry), grammar);
//! let fanout = Fanout::new();
//!
//! let invocations = router.plan(&event)?;
//! let outcomes = fanout.run_all(invocations).await;
//! ```

pub mod fanout;
pub mod matcher;
pub mod plugin;
pub mod registry;
pub mod router;
pub mod schedule;

pub use fanout::{Fanout, FanoutStats, InvocationOutcome};
pub use matcher::{BotIdentity, MentionGrammar, MentionMatch, match_pattern};
pub use plugin::{LoadReport, Plugin, PluginInfo, PluginLoader};
pub use registry::ActionRegistry;
pub use router::Router;
pub use schedule::ScheduleAdapter;
