//! Timed execution: triggers, jobs, and the scheduler seam.
//!
//! The engine only decides *what* should run on a timer; *when* is the
//! scheduler's business. [`Scheduler`] is the trait the runtime's cron
//! driver implements, and [`ScheduledJob`] is the unit handed across
//! that seam.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use std::fmt;

use crate::action::ActionMetadata;
use crate::error::ScheduleError;
use crate::handler::Bindings;
use crate::invocation::{Invocation, InvocationSource};

/// When a scheduled action fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Recurring, five-field cron expression (minute through day-of-week).
    Cron(String),
    /// One-shot, at an absolute instant.
    Date(DateTime<Utc>),
}

impl Trigger {
    /// Recurring trigger from a cron expression.
    pub fn cron(expr: impl Into<String>) -> Self {
        Self::Cron(expr.into())
    }

    /// One-shot trigger at `when`.
    pub fn date(when: DateTime<Utc>) -> Self {
        Self::Date(when)
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cron(expr) => write!(f, "cron {expr}"),
            Self::Date(when) => write!(f, "date {}", when.to_rfc3339()),
        }
    }
}

/// One job as the scheduler sees it.
#[derive(Debug, Clone)]
pub struct ScheduledJob {
    /// Scheduler-wide identity. Adding a job under an existing id replaces
    /// the earlier job rather than double-booking it.
    pub id: String,
    /// When to fire.
    pub trigger: Trigger,
    /// What to run on each firing.
    pub invocation: Invocation,
}

impl ScheduledJob {
    /// Builds the job for a registered `Schedule` action.
    ///
    /// Returns `None` when the action carries no trigger, which only
    /// happens for non-schedule kinds.
    pub fn from_action(meta: &ActionMetadata) -> Option<Self> {
        let trigger = meta.trigger.clone()?;
        let invocation = Invocation {
            id: meta.invocation_id(),
            handler: meta.handler.clone(),
            args: Bindings::new(),
            event: None,
            source: InvocationSource::from(&trigger),
        };
        Some(Self {
            id: format!("{}.{}", meta.owner, meta.name),
            trigger,
            invocation,
        })
    }
}

/// The seam between registration and timed execution.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Books `job`, replacing any earlier job with the same id.
    async fn add_job(&self, job: ScheduledJob) -> Result<(), ScheduleError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionDecl, ActionKind};
    use crate::handler::handler_fn;

    #[test]
    fn job_identity_is_the_fully_qualified_action_name() {
        let meta = ActionDecl::schedule("daily", Trigger::cron("0 9 * * *"), handler_fn(|_ctx| async {}))
            .compile("reporter", "Daily reports")
            .unwrap();
        let job = ScheduledJob::from_action(&meta).unwrap();
        assert_eq!(job.id, "reporter.daily");
        assert_eq!(job.trigger, Trigger::cron("0 9 * * *"));
        assert!(job.invocation.event.is_none());
    }

    #[test]
    fn non_schedule_actions_yield_no_job() {
        let meta = ActionDecl::catch_all("log", handler_fn(|_ctx| async {}))
            .compile("audit", "audit")
            .unwrap();
        assert_eq!(meta.kind, ActionKind::CatchAll);
        assert!(ScheduledJob::from_action(&meta).is_none());
    }

    #[test]
    fn triggers_render_for_logs() {
        assert_eq!(Trigger::cron("*/5 * * * *").to_string(), "cron */5 * * * *");
        let when = DateTime::parse_from_rfc3339("2026-01-02T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(Trigger::date(when).to_string(), "date 2026-01-02T09:00:00+00:00");
    }
}
