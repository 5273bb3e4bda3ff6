//! Planned handler invocations.
//!
//! Routing turns one inbound event (or one scheduler firing) into a batch
//! of [`Invocation`]s. Each invocation is self-contained: it carries the
//! handler, its bindings, and the event view it should observe, so the
//! fan-out stage can run the batch without consulting the registry again.

use std::fmt;
use std::sync::Arc;

use crate::event::Event;
use crate::handler::{ActionContext, Bindings, HandlerFn};
use crate::schedule::Trigger;

/// Stable identity of the action behind an invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InvocationId {
    /// Owning plugin's name.
    pub owner: String,
    /// Handler name within the plugin.
    pub action: String,
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.action)
    }
}

/// What caused an invocation to be planned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationSource {
    /// A live event routed through the catalogs.
    Event {
        /// The event's type value.
        event_type: String,
    },
    /// A scheduler firing, re-entering through the schedule adapter.
    Schedule {
        /// The trigger that fired, rendered for logging.
        trigger: String,
    },
}

impl From<&Trigger> for InvocationSource {
    fn from(trigger: &Trigger) -> Self {
        Self::Schedule {
            trigger: trigger.to_string(),
        }
    }
}

/// One planned handler call.
#[derive(Clone)]
pub struct Invocation {
    /// Identity for logs and failure reports.
    pub id: InvocationId,
    /// The handler to run.
    pub handler: HandlerFn,
    /// Named captures extracted by pattern matching; empty otherwise.
    pub args: Bindings,
    /// The event view the handler observes. `None` for schedule firings.
    pub event: Option<Arc<Event>>,
    /// Provenance, for logging.
    pub source: InvocationSource,
}

impl Invocation {
    /// Builds the context this invocation's handler runs with.
    pub fn context(&self) -> ActionContext {
        match &self.event {
            Some(event) => ActionContext::for_event(Arc::clone(event), self.args.clone()),
            None => ActionContext::for_schedule(self.args.clone()),
        }
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("id", &self.id)
            .field("args", &self.args)
            .field("event", &self.event)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;

    #[test]
    fn id_displays_as_owner_dot_action() {
        let id = InvocationId {
            owner: "general".into(),
            action: "ping".into(),
        };
        assert_eq!(id.to_string(), "general.ping");
    }

    #[test]
    fn context_carries_event_and_bindings() {
        let event = Arc::new(Event::message("C1", "ping"));
        let mut args = Bindings::new();
        args.insert("word", "ping");
        let invocation = Invocation {
            id: InvocationId {
                owner: "general".into(),
                action: "ping".into(),
            },
            handler: handler_fn(|_ctx| async {}),
            args,
            event: Some(Arc::clone(&event)),
            source: InvocationSource::Event {
                event_type: "message".into(),
            },
        };

        let ctx = invocation.context();
        assert_eq!(ctx.text(), Some("ping"));
        assert_eq!(ctx.arg("word"), Some("ping"));
    }

    #[test]
    fn schedule_invocations_have_no_event() {
        let invocation = Invocation {
            id: InvocationId {
                owner: "reporter".into(),
                action: "daily".into(),
            },
            handler: handler_fn(|_ctx| async {}),
            args: Bindings::new(),
            event: None,
            source: InvocationSource::Schedule {
                trigger: "cron 0 9 * * *".into(),
            },
        };
        assert!(invocation.context().event().is_none());
    }
}
