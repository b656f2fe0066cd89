//! # Scheduler
//!
//! Runs daily tasks at a fixed local time. Each run takes two locks in the
//! shared database:
//!
//! - `schedule:{name}:{YYYYMMDDHHMM}`: one node per scheduled slot. Never
//!   released; it expires after an hour.
//! - `schedule:{name}:overlap`: no second run while one is in progress.
//!   Released when the run ends; expires after a day in case the node dies.
//!
//! A node that cannot take a lock skips the run and logs why.

pub mod tasks;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use tracing::{error, info, warn};

use crate::backend::storage::{Connection, LockStorage};

pub use tasks::{CheckBudgetLimits, RenewRecurringBudgets};

const SLOT_LOCK_TTL: Duration = Duration::from_secs(60 * 60);
const OVERLAP_LOCK_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[async_trait]
pub trait ScheduledTask: Send + Sync {
    /// Command name, e.g. `budgets:check-limits`
    fn name(&self) -> &'static str;

    /// Run once for `today`; returns a one-line summary for the log
    async fn run(&self, today: NaiveDate) -> anyhow::Result<String>;
}

#[derive(Clone)]
pub struct ScheduledEntry {
    pub task: Arc<dyn ScheduledTask>,
    /// Local time of day
    pub at: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(String),
    /// Another node took this slot
    SkippedOtherNode,
    /// A previous run is still in progress
    SkippedOverlap,
    Failed(String),
}

pub fn slot_lock_name(task: &str, slot: NaiveDateTime) -> String {
    format!("schedule:{}:{}", task, slot.format("%Y%m%d%H%M"))
}

pub fn overlap_lock_name(task: &str) -> String {
    format!("schedule:{}:overlap", task)
}

/// The first time `at` strictly after `now`
pub fn next_run_after(at: NaiveTime, now: NaiveDateTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        now.date()
            .succ_opt()
            .map(|tomorrow| tomorrow.and_time(at))
            .unwrap_or(NaiveDateTime::MAX)
    }
}

/// Truncate to the minute, the granularity of slot locks
fn minute_of(now: NaiveDateTime) -> NaiveDateTime {
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}

#[derive(Clone)]
pub struct Scheduler<C: Connection> {
    entries: Vec<ScheduledEntry>,
    locks: C::LockRepository,
    node_id: String,
}

impl<C: Connection> Scheduler<C> {
    pub fn new(connection: &C, node_id: impl Into<String>) -> Self {
        Self {
            entries: Vec::new(),
            locks: connection.create_lock_repository(),
            node_id: node_id.into(),
        }
    }

    pub fn daily_at(mut self, task: Arc<dyn ScheduledTask>, at: NaiveTime) -> Self {
        self.entries.push(ScheduledEntry { task, at });
        self
    }

    pub fn entries(&self) -> &[ScheduledEntry] {
        &self.entries
    }

    /// Run a task for the given slot if both locks can be taken
    pub async fn run_task(&self, task: &dyn ScheduledTask, slot: NaiveDateTime) -> RunOutcome {
        let name = task.name();

        let slot_lock = slot_lock_name(name, slot);
        match self.locks.try_acquire(&slot_lock, &self.node_id, SLOT_LOCK_TTL).await {
            Ok(true) => {}
            Ok(false) => {
                info!(target: "scheduler", task = name, %slot, "Skipped, another node runs this slot");
                return RunOutcome::SkippedOtherNode;
            }
            Err(e) => {
                error!(target: "scheduler", task = name, error = %e, "Could not take slot lock");
                return RunOutcome::Failed(e.to_string());
            }
        }

        let overlap_lock = overlap_lock_name(name);
        match self.locks.try_acquire(&overlap_lock, &self.node_id, OVERLAP_LOCK_TTL).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(target: "scheduler", task = name, "Skipped, previous run still in progress");
                return RunOutcome::SkippedOverlap;
            }
            Err(e) => {
                error!(target: "scheduler", task = name, error = %e, "Could not take overlap lock");
                return RunOutcome::Failed(e.to_string());
            }
        }

        info!(target: "scheduler", task = name, node = %self.node_id, "Running scheduled task");
        let outcome = match task.run(slot.date()).await {
            Ok(summary) => {
                info!(target: "scheduler", task = name, "{}", summary);
                RunOutcome::Completed(summary)
            }
            Err(e) => {
                error!(target: "scheduler", task = name, error = %format!("{:#}", e), "Scheduled task failed");
                RunOutcome::Failed(format!("{:#}", e))
            }
        };

        if let Err(e) = self.locks.release(&overlap_lock, &self.node_id).await {
            error!(target: "scheduler", task = name, error = %e, "Could not release overlap lock");
        }
        outcome
    }

    /// Run a task by name right now, as the CLI does
    pub async fn run_now(&self, name: &str) -> Option<RunOutcome> {
        let entry = self.entries.iter().find(|e| e.task.name() == name)?;
        let slot = minute_of(Local::now().naive_local());
        Some(self.run_task(entry.task.as_ref(), slot).await)
    }

    /// Sleep until each entry is due and run it, forever
    pub async fn run(self) {
        if self.entries.is_empty() {
            warn!(target: "scheduler", "No scheduled tasks");
            return;
        }
        for entry in &self.entries {
            info!(target: "scheduler", task = entry.task.name(), at = %entry.at, "Scheduled daily");
        }

        let scheduler = Arc::new(self);
        loop {
            let now = Local::now().naive_local();
            let next = scheduler
                .entries
                .iter()
                .map(|e| next_run_after(e.at, now))
                .min()
                .unwrap_or(NaiveDateTime::MAX);

            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            tokio::time::sleep(wait).await;

            for entry in scheduler.entries.iter().filter(|e| next.time() == e.at) {
                let scheduler = scheduler.clone();
                let task = entry.task.clone();
                tokio::spawn(async move {
                    scheduler.run_task(task.as_ref(), minute_of(next)).await;
                });
            }
        }
    }
}
