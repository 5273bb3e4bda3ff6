//! Handler types and the structured argument record.
//!
//! A handler is a boxed async callable bound to one plugin instance. It
//! receives an [`ActionContext`] — the event (absent for scheduled fires)
//! plus [`Bindings`], the ordered named-capture record the router extracted
//! from the matched pattern. There is no reflection anywhere: captures
//! arrive as an explicit record, not keyword dispatch.
//!
//! # Writing handlers
//!
//! Free functions and closures go through [`handler_fn`]; plugin methods
//! go through [`bind`], which clones the plugin's `Arc` into the handler:
//!
//! ```rust,ignore
//! let plugin = Arc::new(Echo::new(responder));
//! let decl = ActionDecl::listen_to(
//!     "repeat",
//!     r"^echo (?P<what>.+)$",
//!     bind(&plugin, Echo::repeat),
//! );
//! ```
//!
//! Handlers may return `()` or `Result<(), E>`; both are folded into the
//! engine's failure reporting via [`IntoHandlerResult`].

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::HandlerError;
use crate::event::Event;

/// Future type produced by one handler invocation.
pub type HandlerFuture = BoxFuture<'static, Result<(), HandlerError>>;

/// A boxed handler callable, clonable and bound to its plugin instance.
pub type HandlerFn = Arc<dyn Fn(ActionContext) -> HandlerFuture + Send + Sync>;

// ─── Bindings ─────────────────────────────────────────────────────────────────

/// Ordered record of named values passed to a handler.
///
/// For live events these are the pattern's named capture groups, in the
/// order the groups appear in the pattern; unmatched optional groups are
/// absent. For scheduled invocations these are the fixed arguments bound at
/// registration time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings(Vec<(String, String)>);

impl Bindings {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing any existing entry with the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    /// Looks a value up by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut bindings = Self::new();
        for (name, value) in iter {
            bindings.insert(name, value);
        }
        bindings
    }
}

// ─── ActionContext ────────────────────────────────────────────────────────────

/// Everything one handler invocation gets to see.
#[derive(Debug, Clone)]
pub struct ActionContext {
    event: Option<Arc<Event>>,
    args: Bindings,
}

impl ActionContext {
    /// Context for a live-event invocation.
    pub fn for_event(event: Arc<Event>, args: Bindings) -> Self {
        Self {
            event: Some(event),
            args,
        }
    }

    /// Context for a scheduled invocation; carries no event.
    pub fn for_schedule(args: Bindings) -> Self {
        Self { event: None, args }
    }

    /// The originating event, absent for scheduled fires.
    pub fn event(&self) -> Option<&Event> {
        self.event.as_deref()
    }

    /// The event's text as the handler should see it (mention-stripped for
    /// directed messages).
    pub fn text(&self) -> Option<&str> {
        self.event.as_deref().map(Event::text)
    }

    /// The event's destination identifier.
    pub fn channel(&self) -> Option<&str> {
        self.event.as_deref().and_then(|e| e.channel.as_deref())
    }

    /// The full argument record.
    pub fn args(&self) -> &Bindings {
        &self.args
    }

    /// A single argument by capture-group name.
    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args.get(name)
    }
}

// ─── Handler construction ─────────────────────────────────────────────────────

/// Conversion from a handler's return value into the engine's result.
pub trait IntoHandlerResult {
    /// Folds the value into `Result<(), HandlerError>`.
    fn into_handler_result(self) -> Result<(), HandlerError>;
}

impl IntoHandlerResult for () {
    fn into_handler_result(self) -> Result<(), HandlerError> {
        Ok(())
    }
}

impl<E> IntoHandlerResult for Result<(), E>
where
    E: Into<HandlerError>,
{
    fn into_handler_result(self) -> Result<(), HandlerError> {
        self.map_err(Into::into)
    }
}

/// Wraps a free async function or closure as a [`HandlerFn`].
pub fn handler_fn<F, Fut, R>(f: F) -> HandlerFn
where
    F: Fn(ActionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoHandlerResult,
{
    Arc::new(move |ctx| {
        let fut = f(ctx);
        Box::pin(async move { fut.await.into_handler_result() })
    })
}

/// Binds a plugin method as a [`HandlerFn`], cloning the plugin's `Arc`
/// into every invocation.
pub fn bind<P, F, Fut, R>(plugin: &Arc<P>, f: F) -> HandlerFn
where
    P: Send + Sync + 'static,
    F: Fn(Arc<P>, ActionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoHandlerResult,
{
    let plugin = Arc::clone(plugin);
    Arc::new(move |ctx| {
        let fut = f(Arc::clone(&plugin), ctx);
        Box::pin(async move { fut.await.into_handler_result() })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn bindings_preserve_insertion_order() {
        let mut args = Bindings::new();
        args.insert("greeting", "hi");
        args.insert("name", "sam");
        let order: Vec<&str> = args.iter().map(|(n, _)| n).collect();
        assert_eq!(order, vec!["greeting", "name"]);
    }

    #[test]
    fn bindings_insert_replaces_by_name() {
        let mut args = Bindings::new();
        args.insert("name", "sam");
        args.insert("name", "alex");
        assert_eq!(args.len(), 1);
        assert_eq!(args.get("name"), Some("alex"));
    }

    #[tokio::test]
    async fn handler_fn_accepts_unit_return() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let handler = handler_fn(move |_ctx| {
            let seen = Arc::clone(&seen);
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        });

        let ctx = ActionContext::for_schedule(Bindings::new());
        handler(ctx).await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn handler_fn_propagates_errors() {
        let handler = handler_fn(|_ctx| async move {
            Err::<(), _>(std::io::Error::other("boom"))
        });

        let result = handler(ActionContext::for_schedule(Bindings::new())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn bind_hands_the_plugin_to_its_method() {
        struct Counter {
            fired: AtomicUsize,
        }

        impl Counter {
            async fn bump(self: Arc<Self>, _ctx: ActionContext) {
                self.fired.fetch_add(1, Ordering::SeqCst);
            }
        }

        let plugin = Arc::new(Counter {
            fired: AtomicUsize::new(0),
        });
        let handler = bind(&plugin, Counter::bump);

        handler(ActionContext::for_schedule(Bindings::new()))
            .await
            .unwrap();
        handler(ActionContext::for_schedule(Bindings::new()))
            .await
            .unwrap();
        assert_eq!(plugin.fired.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn context_reads_event_fields() {
        let event = Arc::new(Event::message("C1", "echo hello"));
        let mut args = Bindings::new();
        args.insert("what", "hello");

        let ctx = ActionContext::for_event(event, args);
        assert_eq!(ctx.channel(), Some("C1"));
        assert_eq!(ctx.text(), Some("echo hello"));
        assert_eq!(ctx.arg("what"), Some("hello"));
        assert_eq!(ctx.arg("missing"), None);
    }
}
