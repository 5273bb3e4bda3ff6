//! Concurrent, failure-isolated execution of an invocation batch.
//!
//! Every invocation runs in its own task. A handler returning an error or
//! panicking affects nothing but its own outcome slot: siblings keep
//! running, the receive loop keeps receiving, and the failure surfaces as
//! a structured log line plus an [`InvocationOutcome`].

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::join_all;

use machina_core::error::HandlerFailure;
use machina_core::invocation::{Invocation, InvocationId};

/// How one invocation ended.
#[derive(Debug)]
pub struct InvocationOutcome {
    /// The action that ran.
    pub id: InvocationId,
    /// `Ok` on clean completion, otherwise the contained failure.
    pub result: Result<(), HandlerFailure>,
}

impl InvocationOutcome {
    /// Whether the handler completed cleanly.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Counter snapshot for the engine's dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanoutStats {
    /// Invocations spawned since startup.
    pub launched: u64,
    /// Invocations that completed cleanly.
    pub succeeded: u64,
    /// Invocations that errored or panicked.
    pub failed: u64,
}

/// Runs invocation batches, one task per invocation.
#[derive(Debug, Default)]
pub struct Fanout {
    launched: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

impl Fanout {
    /// Fan-out with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the whole batch concurrently and waits for every invocation.
    ///
    /// Outcomes come back in batch order regardless of completion order.
    pub async fn run_all(&self, invocations: Vec<Invocation>) -> Vec<InvocationOutcome> {
        let mut ids = Vec::with_capacity(invocations.len());
        let mut tasks = Vec::with_capacity(invocations.len());
        for invocation in invocations {
            let ctx = invocation.context();
            let Invocation { id, handler, .. } = invocation;
            // The handler call happens inside the task so a panic while
            // constructing the future is contained as well.
            ids.push(id);
            tasks.push(tokio::spawn(async move { handler(ctx).await }));
        }
        self.launched.fetch_add(tasks.len() as u64, Ordering::Relaxed);

        let mut outcomes = Vec::with_capacity(tasks.len());
        for (id, joined) in ids.into_iter().zip(join_all(tasks).await) {
            let result = match joined {
                Ok(Ok(())) => Ok(()),
                Ok(Err(error)) => Err(HandlerFailure::Error(error)),
                Err(join) if join.is_panic() => {
                    Err(HandlerFailure::Panicked(panic_message(join.into_panic())))
                }
                Err(join) => Err(HandlerFailure::Error(Box::new(join))),
            };
            match &result {
                Ok(()) => {
                    self.succeeded.fetch_add(1, Ordering::Relaxed);
                    tracing::trace!(invocation = %id, "handler completed");
                }
                Err(failure) => {
                    self.failed.fetch_add(1, Ordering::Relaxed);
                    tracing::error!(invocation = %id, error = %failure, "handler failed");
                }
            }
            outcomes.push(InvocationOutcome { id, result });
        }
        outcomes
    }

    /// Snapshot of the lifetime counters.
    pub fn stats(&self) -> FanoutStats {
        FanoutStats {
            launched: self.launched.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "opaque panic payload".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use machina_core::error::HandlerError;
    use machina_core::handler::{ActionContext, Bindings, HandlerFn, handler_fn};
    use machina_core::invocation::InvocationSource;

    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn invocation(name: &str, handler: HandlerFn) -> Invocation {
        Invocation {
            id: InvocationId {
                owner: "test".into(),
                action: name.into(),
            },
            handler,
            args: Bindings::new(),
            event: None,
            source: InvocationSource::Event {
                event_type: "test".into(),
            },
        }
    }

    #[tokio::test]
    async fn failures_do_not_cancel_siblings() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let ok = handler_fn(move |_ctx| {
            let seen = Arc::clone(&seen);
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        });
        let erring = handler_fn(|_ctx| async { Err::<(), HandlerError>("boom".into()) });
        // The declared unit return keeps the diverging body from steering
        // handler output inference toward the never type.
        async fn kaboom(_ctx: ActionContext) {
            panic!("kaboom");
        }
        let panicking = handler_fn(kaboom);

        let fanout = Fanout::new();
        let outcomes = fanout
            .run_all(vec![
                invocation("ok", ok),
                invocation("err", erring),
                invocation("panic", panicking),
            ])
            .await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(outcomes[0].is_ok());
        assert!(matches!(outcomes[1].result, Err(HandlerFailure::Error(_))));
        match &outcomes[2].result {
            Err(HandlerFailure::Panicked(detail)) => assert!(detail.contains("kaboom")),
            other => panic!("expected a contained panic, got {other:?}"),
        }

        let stats = fanout.stats();
        assert_eq!((stats.launched, stats.succeeded, stats.failed), (3, 1, 2));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn the_batch_runs_concurrently() {
        // Both handlers block on the same rendezvous, so the batch can only
        // complete if they are in flight at the same time.
        let barrier = Arc::new(tokio::sync::Barrier::new(2));

        let make = |barrier: Arc<tokio::sync::Barrier>| {
            handler_fn(move |_ctx| {
                let barrier = Arc::clone(&barrier);
                async move {
                    barrier.wait().await;
                }
            })
        };

        let fanout = Fanout::new();
        let outcomes = tokio::time::timeout(
            Duration::from_secs(5),
            fanout.run_all(vec![
                invocation("left", make(Arc::clone(&barrier))),
                invocation("right", make(barrier)),
            ]),
        )
        .await
        .expect("batch deadlocked, invocations did not run concurrently");

        assert!(outcomes.iter().all(InvocationOutcome::is_ok));
    }

    #[tokio::test]
    async fn outcomes_keep_batch_order() {
        let slow = handler_fn(|_ctx| async {
            tokio::time::sleep(Duration::from_millis(20)).await;
        });
        let fast = handler_fn(|_ctx| async {});

        let fanout = Fanout::new();
        let outcomes = fanout
            .run_all(vec![invocation("slow", slow), invocation("fast", fast)])
            .await;

        let order: Vec<String> = outcomes.iter().map(|o| o.id.to_string()).collect();
        assert_eq!(order, vec!["test.slow", "test.fast"]);
    }

    #[tokio::test]
    async fn empty_batches_are_a_no_op() {
        let fanout = Fanout::new();
        assert!(fanout.run_all(Vec::new()).await.is_empty());
        assert_eq!(fanout.stats().launched, 0);
    }
}
