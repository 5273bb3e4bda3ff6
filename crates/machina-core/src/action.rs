//! Action taxonomy, declarations, and registered metadata.
//!
//! Plugins declare [`ActionDecl`] values during their registration phase;
//! the registry compiles each declaration into an [`ActionMetadata`] —
//! the immutable catalog entry dispatch works from. The split keeps
//! declaration cheap and fallible compilation (pattern syntax, required
//! configuration) in one place.

use std::fmt;

use regex::Regex;

use crate::error::{RegistrationError, RegistrationResult};
use crate::handler::HandlerFn;
use crate::invocation::InvocationId;
use crate::schedule::Trigger;

/// The closed set of action kinds a plugin can contribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Fires on a specific event-type value.
    Process,
    /// Fires on any message matching a pattern.
    ListenTo,
    /// Fires on a message directed at the bot matching a pattern.
    RespondTo,
    /// Fires on every event, regardless of type.
    CatchAll,
    /// Fires on a timer, never on live events.
    Schedule,
    /// Catalogued for an external HTTP surface; never dispatched here.
    Route,
}

impl ActionKind {
    /// Stable lowercase name, used in logs and keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Process => "process",
            Self::ListenTo => "listen_to",
            Self::RespondTo => "respond_to",
            Self::CatchAll => "catch_all",
            Self::Schedule => "schedule",
            Self::Route => "route",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured help declaration for one action.
///
/// Replaces free-text documentation parsing: the command syntax and its
/// one-line description are declared explicitly at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionHelp {
    /// The command syntax shown to users (e.g. `"echo <text>"`).
    pub command: String,
    /// One-line description of what the command does.
    pub summary: String,
}

impl ActionHelp {
    /// Creates a help declaration.
    pub fn new(command: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            summary: summary.into(),
        }
    }
}

// ─── ActionDecl ───────────────────────────────────────────────────────────────

/// One action as a plugin declares it.
///
/// Patterns are carried as source text here; they are compiled when the
/// declaration is registered, so a syntax error fails that single
/// registration with a [`RegistrationError::PatternCompile`].
#[derive(Clone)]
pub struct ActionDecl {
    /// Which catalog this action belongs to.
    pub kind: ActionKind,
    /// Handler name, unique within the owning plugin.
    pub name: String,
    /// Pattern source for `ListenTo`/`RespondTo`.
    pub pattern: Option<String>,
    /// Exact event type for `Process`.
    pub event_type: Option<String>,
    /// Trigger spec for `Schedule`.
    pub trigger: Option<Trigger>,
    /// Configuration keys this action needs; checked at registration only.
    pub required_config: Vec<String>,
    /// Structured help shown in the help index.
    pub help: Option<ActionHelp>,
    /// The bound handler.
    pub handler: HandlerFn,
}

impl ActionDecl {
    fn new(kind: ActionKind, name: impl Into<String>, handler: HandlerFn) -> Self {
        Self {
            kind,
            name: name.into(),
            pattern: None,
            event_type: None,
            trigger: None,
            required_config: Vec::new(),
            help: None,
            handler,
        }
    }

    /// Declares a handler fired on every message matching `pattern`.
    pub fn listen_to(name: impl Into<String>, pattern: impl Into<String>, handler: HandlerFn) -> Self {
        let mut decl = Self::new(ActionKind::ListenTo, name, handler);
        decl.pattern = Some(pattern.into());
        decl
    }

    /// Declares a handler fired on messages directed at the bot matching
    /// `pattern`.
    pub fn respond_to(name: impl Into<String>, pattern: impl Into<String>, handler: HandlerFn) -> Self {
        let mut decl = Self::new(ActionKind::RespondTo, name, handler);
        decl.pattern = Some(pattern.into());
        decl
    }

    /// Declares a handler fired on every event of exactly `event_type`.
    pub fn process(name: impl Into<String>, event_type: impl Into<String>, handler: HandlerFn) -> Self {
        let mut decl = Self::new(ActionKind::Process, name, handler);
        decl.event_type = Some(event_type.into());
        decl
    }

    /// Declares a handler fired on every event, unconditionally.
    pub fn catch_all(name: impl Into<String>, handler: HandlerFn) -> Self {
        Self::new(ActionKind::CatchAll, name, handler)
    }

    /// Declares a handler fired by the scheduler on `trigger`.
    pub fn schedule(name: impl Into<String>, trigger: Trigger, handler: HandlerFn) -> Self {
        let mut decl = Self::new(ActionKind::Schedule, name, handler);
        decl.trigger = Some(trigger);
        decl
    }

    /// Declares a handler catalogued for an external HTTP surface.
    pub fn route(name: impl Into<String>, handler: HandlerFn) -> Self {
        Self::new(ActionKind::Route, name, handler)
    }

    /// Attaches a structured help declaration.
    pub fn with_help(mut self, command: impl Into<String>, summary: impl Into<String>) -> Self {
        self.help = Some(ActionHelp::new(command, summary));
        self
    }

    /// Declares configuration keys this action needs to run.
    pub fn requires_config<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_config = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Compiles this declaration into registered metadata.
    ///
    /// `owner` is the plugin name, `owner_summary` the plugin's display
    /// line for help grouping.
    pub fn compile(self, owner: &str, owner_summary: &str) -> RegistrationResult<ActionMetadata> {
        let pattern = match &self.pattern {
            Some(source) => {
                Some(
                    Regex::new(source).map_err(|source| RegistrationError::PatternCompile {
                        action: format!("{}.{}", owner, self.name),
                        source,
                    })?,
                )
            }
            None => None,
        };

        Ok(ActionMetadata {
            kind: self.kind,
            owner: owner.to_string(),
            owner_summary: owner_summary.to_string(),
            name: self.name,
            pattern,
            event_type: self.event_type,
            trigger: self.trigger,
            required_config: self.required_config,
            help: self.help,
            handler: self.handler,
        })
    }
}

impl fmt::Debug for ActionDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDecl")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .field("event_type", &self.event_type)
            .field("trigger", &self.trigger)
            .field("required_config", &self.required_config)
            .field("help", &self.help)
            .finish_non_exhaustive()
    }
}

// ─── ActionMetadata ───────────────────────────────────────────────────────────

/// One registered action: the immutable catalog entry.
#[derive(Clone)]
pub struct ActionMetadata {
    /// Which catalog this action lives in.
    pub kind: ActionKind,
    /// Owning plugin's name.
    pub owner: String,
    /// Owning plugin's display line for help grouping.
    pub owner_summary: String,
    /// Handler name within the plugin.
    pub name: String,
    /// Compiled pattern for `ListenTo`/`RespondTo`.
    pub pattern: Option<Regex>,
    /// Exact event type for `Process`.
    pub event_type: Option<String>,
    /// Trigger spec for `Schedule`.
    pub trigger: Option<Trigger>,
    /// Configuration keys this action declared.
    pub required_config: Vec<String>,
    /// Structured help, if declared.
    pub help: Option<ActionHelp>,
    /// The bound handler.
    pub handler: HandlerFn,
}

impl ActionMetadata {
    /// Stable catalog key: owner + handler name, plus the pattern text for
    /// multi-pattern handlers. Re-registering under the same key replaces
    /// the prior entry.
    pub fn key(&self) -> String {
        match &self.pattern {
            Some(re) => format!("{}.{}-{}", self.owner, self.name, re.as_str()),
            None => format!("{}.{}", self.owner, self.name),
        }
    }

    /// Identity used in invocation logging.
    pub fn invocation_id(&self) -> InvocationId {
        InvocationId {
            owner: self.owner.clone(),
            action: self.name.clone(),
        }
    }
}

impl fmt::Debug for ActionMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionMetadata")
            .field("kind", &self.kind)
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field("event_type", &self.event_type)
            .field("trigger", &self.trigger)
            .finish_non_exhaustive()
    }
}
