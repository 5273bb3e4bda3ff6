//! Cron-driven job scheduler.
//!
//! [`CronScheduler`] is the runtime's implementation of the
//! [`machina_core::Scheduler`] seam. It keeps one entry per job id with a
//! precomputed next-run instant, sleeps until the earliest one, and hands
//! due jobs to the engine's [`ScheduleAdapter`] for fan-out. Adding or
//! replacing a job wakes the loop so the sleep is recomputed.
//!
//! Cron triggers recur; date triggers fire once and are dropped. A date
//! that is already in the past fires on the next loop pass.

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use machina_core::{ScheduleError, ScheduledJob, Scheduler, Trigger};
use machina_engine::ScheduleAdapter;

/// A job with its precomputed next firing.
///
/// `next` is `None` only after a one-shot has fired or a cron expression
/// has run out of occurrences; such entries are pruned on the next pass.
struct Entry {
    job: ScheduledJob,
    next: Option<DateTime<Utc>>,
}

/// Timer loop over the registered schedule actions.
pub struct CronScheduler {
    adapter: Arc<ScheduleAdapter>,
    jobs: Mutex<Vec<Entry>>,
    wake: Notify,
    closed: AtomicBool,
}

impl CronScheduler {
    /// Creates a scheduler that fires jobs through the given adapter.
    pub fn new(adapter: Arc<ScheduleAdapter>) -> Self {
        Self {
            adapter,
            jobs: Mutex::new(Vec::new()),
            wake: Notify::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Spawns the timer loop onto the current tokio runtime.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move { scheduler.run().await })
    }

    /// Stops the timer loop and rejects further jobs.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.wake.notify_one();
    }

    /// Number of jobs currently tracked.
    pub fn job_count(&self) -> usize {
        self.jobs.lock().len()
    }

    async fn run(&self) {
        debug!("scheduler loop started");
        loop {
            if self.closed.load(Ordering::SeqCst) {
                break;
            }

            match self.until_next_due() {
                // Nothing scheduled; sleep until a job arrives or shutdown.
                None => self.wake.notified().await,
                Some(wait) if wait.is_zero() => self.fire_due().await,
                Some(wait) => {
                    tokio::select! {
                        () = tokio::time::sleep(wait) => self.fire_due().await,
                        // A job was added or replaced; recompute the sleep.
                        () = self.wake.notified() => {}
                    }
                }
            }
        }
        debug!("scheduler loop stopped");
    }

    /// Time until the earliest tracked firing, `None` when idle.
    fn until_next_due(&self) -> Option<Duration> {
        let jobs = self.jobs.lock();
        let next = jobs.iter().filter_map(|entry| entry.next).min()?;
        let wait = next.signed_duration_since(Utc::now());
        Some(wait.to_std().unwrap_or(Duration::ZERO))
    }

    /// Fires every due job and reschedules or prunes it.
    async fn fire_due(&self) {
        let now = Utc::now();
        let due: Vec<ScheduledJob> = {
            let mut jobs = self.jobs.lock();
            let mut due = Vec::new();
            for entry in jobs.iter_mut() {
                if entry.next.is_some_and(|at| at <= now) {
                    due.push(entry.job.clone());
                    entry.next = next_occurrence_after(&entry.job.trigger, now);
                }
            }
            jobs.retain(|entry| entry.next.is_some());
            due
        };

        // Firing awaits the whole handler batch, so it runs off-loop to keep
        // one slow job from delaying the next due one.
        for job in due {
            let adapter = Arc::clone(&self.adapter);
            tokio::spawn(async move {
                adapter.fire(&job).await;
            });
        }
    }
}

#[async_trait]
impl Scheduler for CronScheduler {
    async fn add_job(&self, job: ScheduledJob) -> Result<(), ScheduleError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ScheduleError::Closed);
        }

        let now = Utc::now();
        let next = match &job.trigger {
            Trigger::Cron(expr) => match parse_cron(expr)?.after(&now).next() {
                Some(at) => at,
                None => {
                    warn!(job = %job.id, "cron expression has no future occurrences, dropping job");
                    return Ok(());
                }
            },
            // A past date is treated as due right now.
            Trigger::Date(when) => (*when).max(now),
        };

        {
            let mut jobs = self.jobs.lock();
            match jobs.iter_mut().find(|entry| entry.job.id == job.id) {
                Some(existing) => {
                    debug!(job = %job.id, trigger = %job.trigger, "replacing scheduled job");
                    existing.job = job;
                    existing.next = Some(next);
                }
                None => {
                    debug!(job = %job.id, trigger = %job.trigger, next = %next, "job scheduled");
                    jobs.push(Entry {
                        job,
                        next: Some(next),
                    });
                }
            }
        }

        self.wake.notify_one();
        Ok(())
    }
}

/// Next firing of `trigger` strictly after `after`, `None` when exhausted.
fn next_occurrence_after(trigger: &Trigger, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match trigger {
        // The expression parsed when the job was added.
        Trigger::Cron(expr) => parse_cron(expr).ok()?.after(&after).next(),
        Trigger::Date(_) => None,
    }
}

/// Parses a cron expression in either classic or extended form.
fn parse_cron(expr: &str) -> Result<cron::Schedule, ScheduleError> {
    cron::Schedule::from_str(expr)
        .or_else(|_| {
            // The cron crate wants seven fields (sec min hour dom month dow
            // year); classic crontab expressions have five. Pad the missing
            // seconds and year.
            cron::Schedule::from_str(&format!("0 {expr} *"))
        })
        .map_err(|e| ScheduleError::InvalidCron {
            expr: expr.to_string(),
            detail: e.to_string(),
        })
}
