//! Re-entry point for scheduled work.
//!
//! The scheduler driver lives outside this crate and only knows about
//! [`ScheduledJob`]s. When a trigger fires, the job comes back through
//! [`ScheduleAdapter::fire`] and re-enters the same fan-out stage live
//! events use, so scheduled handlers get identical failure isolation and
//! logging.

use std::sync::Arc;

use machina_core::schedule::ScheduledJob;

use crate::fanout::{Fanout, InvocationOutcome};
use crate::registry::ActionRegistry;

/// Bridges scheduler firings back into the dispatch pipeline.
#[derive(Debug)]
pub struct ScheduleAdapter {
    fanout: Arc<Fanout>,
}

impl ScheduleAdapter {
    /// Adapter executing through `fanout`.
    pub fn new(fanout: Arc<Fanout>) -> Self {
        Self { fanout }
    }

    /// The jobs to book for every schedule action currently registered.
    pub fn collect_jobs(registry: &ActionRegistry) -> Vec<ScheduledJob> {
        registry
            .schedule_actions()
            .iter()
            .filter_map(ScheduledJob::from_action)
            .collect()
    }

    /// Runs one firing of `job` and reports its outcome.
    pub async fn fire(&self, job: &ScheduledJob) -> Vec<InvocationOutcome> {
        tracing::debug!(job = %job.id, trigger = %job.trigger, "scheduled job firing");
        self.fanout.run_all(vec![job.invocation.clone()]).await
    }
}
