//! Periodic task scheduling.
//!
//! One interface, two backends:
//!
//! ```text
//!                    ┌──────────────────────┐
//!   add / remove ──▶ │    TaskScheduler     │ ◀── task / task_count
//!   enable/disable   └──────────┬───────────┘
//!                     ┌─────────┴──────────┐
//!                     ▼                    ▼
//!         CooperativeScheduler       AffineScheduler
//!         update(now) from one       one pinned thread per task,
//!         loop, table order          work → sleep(period) → repeat
//! ```
//!
//! Task lifecycle: `Registered → Enabled ⇄ Disabled → Removed`.  Tasks are
//! registered enabled, names are unique, the table holds at most
//! [`MAX_TASKS`] entries and lookup is a linear scan by name.

pub mod affine;
pub mod cooperative;

use log::info;
use serde::Serialize;

use crate::error::SchedulerError;

pub use affine::{AffineJob, AffineScheduler, Core, TaskMonitor};
pub use cooperative::{CooperativeScheduler, TaskFn};

/// Task table capacity.
pub const MAX_TASKS: usize = 16;

/// Longest accepted task name (bytes).
pub const MAX_TASK_NAME: usize = 24;

pub type TaskName = heapless::String<MAX_TASK_NAME>;

/// Snapshot of one task's bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskInfo {
    pub name: TaskName,
    pub interval_ms: u32,
    pub enabled: bool,
    pub execution_count: u32,
    pub last_execution_ms: u32,
}

/// Scheduling policy shared by both backends.
pub trait TaskScheduler {
    /// What a task runs.
    type Work;

    /// Register an enabled task.  Fails when the table is full or the name
    /// is taken.
    fn add_task(&mut self, name: &str, work: Self::Work, interval_ms: u32) -> Result<(), SchedulerError>;

    /// Unregister a task, keeping the order of the others.
    fn remove_task(&mut self, name: &str) -> Result<(), SchedulerError>;

    fn enable_task(&mut self, name: &str) -> Result<(), SchedulerError>;

    fn disable_task(&mut self, name: &str) -> Result<(), SchedulerError>;

    fn task(&self, name: &str) -> Option<TaskInfo>;

    fn task_count(&self) -> usize;

    /// Snapshots of every task, in table order.
    fn tasks(&self) -> heapless::Vec<TaskInfo, MAX_TASKS>;

    /// Dump the table to the log.
    fn log_tasks(&self) {
        let tasks = self.tasks();
        info!("Scheduler: {} task(s)", tasks.len());
        for t in &tasks {
            info!(
                "Scheduler:   {:<16} every {:>5}ms  {}  runs={} last={}ms",
                t.name.as_str(),
                t.interval_ms,
                if t.enabled { "on " } else { "off" },
                t.execution_count,
                t.last_execution_ms
            );
        }
    }
}

/// Validate and copy a task name.
pub(crate) fn task_name(name: &str) -> Result<TaskName, SchedulerError> {
    TaskName::try_from(name).map_err(|_| SchedulerError::NameTooLong)
}
