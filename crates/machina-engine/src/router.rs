//! Turning one event into a batch of invocations.
//!
//! Planning is pure catalog work, no handler runs here. The batch for an
//! event is, in catalog order:
//!
//! - every catch-all action,
//! - every process action whose event type matches exactly,
//! - for messages: the respond catalog when the message is directed at
//!   the bot, otherwise the listen catalog. Never both.
//!
//! Directed messages are planned against a mention-stripped copy of the
//! event, so respond patterns match what the user actually said to the
//! bot. Everything else observes the event untouched.

use std::sync::Arc;

use machina_core::action::ActionMetadata;
use machina_core::error::MalformedEvent;
use machina_core::event::Event;
use machina_core::handler::Bindings;
use machina_core::invocation::{Invocation, InvocationSource};

use crate::matcher::{MentionGrammar, MentionMatch, match_pattern};
use crate::registry::ActionRegistry;

/// Plans inbound events against the registry's catalogs.
#[derive(Debug)]
pub struct Router {
    registry: Arc<ActionRegistry>,
    grammar: MentionGrammar,
}

impl Router {
    /// Router over `registry`, detecting mentions with `grammar`.
    pub fn new(registry: Arc<ActionRegistry>, grammar: MentionGrammar) -> Self {
        Self { registry, grammar }
    }

    /// The registry this router plans against.
    pub fn registry(&self) -> &Arc<ActionRegistry> {
        &self.registry
    }

    /// Plans the full invocation batch for `event`.
    ///
    /// A malformed message event poisons its whole batch: the error means
    /// zero invocations run, including catch-alls that would not have
    /// needed the channel.
    pub fn plan(&self, event: &Event) -> Result<Vec<Invocation>, MalformedEvent> {
        let mut invocations = Vec::new();
        let shared = Arc::new(event.clone());

        for meta in self.registry.catch_all_actions() {
            invocations.push(Self::invocation(meta, Bindings::new(), &shared));
        }

        for meta in self.registry.process_actions() {
            if meta.event_type.as_deref() == Some(event.event_type.as_str()) {
                invocations.push(Self::invocation(meta, Bindings::new(), &shared));
            }
        }

        if event.is_message() {
            match self.grammar.detect(event)? {
                MentionMatch::Directed { stripped } => {
                    let directed = match stripped {
                        Some(text) => Arc::new(event.with_text(text)),
                        None => Arc::clone(&shared),
                    };
                    for meta in self.registry.respond_actions() {
                        if let Some(args) = Self::pattern_args(meta, directed.text()) {
                            invocations.push(Self::invocation(meta, args, &directed));
                        }
                    }
                }
                MentionMatch::Undirected => {
                    for meta in self.registry.listen_actions() {
                        if let Some(args) = Self::pattern_args(meta, shared.text()) {
                            invocations.push(Self::invocation(meta, args, &shared));
                        }
                    }
                }
            }
        }

        tracing::debug!(
            event_type = %event.event_type,
            planned = invocations.len(),
            "event planned"
        );
        Ok(invocations)
    }

    fn pattern_args(meta: &ActionMetadata, text: &str) -> Option<Bindings> {
        meta.pattern
            .as_ref()
            .and_then(|pattern| match_pattern(pattern, text))
    }

    fn invocation(meta: &ActionMetadata, args: Bindings, event: &Arc<Event>) -> Invocation {
        Invocation {
            id: meta.invocation_id(),
            handler: meta.handler.clone(),
            args,
            event: Some(Arc::clone(event)),
            source: InvocationSource::Event {
                event_type: event.event_type.clone(),
            },
        }
    }
}
