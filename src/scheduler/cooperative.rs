//! Single-context cooperative scheduler.
//!
//! The caller drives [`CooperativeScheduler::update`] from its main loop.
//! Each call runs, in table order, every enabled task that is due: interval
//! 0 means "every call", otherwise at least `interval_ms` must have passed
//! since the task last ran.  Tasks start with a last-run time of 0.
//!
//! Work functions receive the context passed to `update`, so tasks own no
//! globals; whatever they touch lives in `C`.

use log::{info, warn};

use super::{MAX_TASKS, TaskInfo, TaskName, TaskScheduler, task_name};
use crate::error::SchedulerError;

/// Work run by a cooperative task.
pub type TaskFn<C> = fn(&mut C);

struct TaskEntry<C> {
    name: TaskName,
    work: TaskFn<C>,
    interval_ms: u32,
    last_execution_ms: u32,
    execution_count: u32,
    enabled: bool,
}

impl<C> TaskEntry<C> {
    fn info(&self) -> TaskInfo {
        TaskInfo {
            name: self.name.clone(),
            interval_ms: self.interval_ms,
            enabled: self.enabled,
            execution_count: self.execution_count,
            last_execution_ms: self.last_execution_ms,
        }
    }

    fn is_due(&self, now_ms: u32) -> bool {
        self.interval_ms == 0 || now_ms.wrapping_sub(self.last_execution_ms) >= self.interval_ms
    }
}

pub struct CooperativeScheduler<C> {
    tasks: heapless::Vec<TaskEntry<C>, MAX_TASKS>,
}

impl<C> Default for CooperativeScheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> CooperativeScheduler<C> {
    pub const fn new() -> Self {
        Self {
            tasks: heapless::Vec::new(),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.name == name)
    }

    fn entry_mut(&mut self, name: &str) -> Result<&mut TaskEntry<C>, SchedulerError> {
        self.tasks
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or(SchedulerError::NotFound)
    }

    /// Run every due task once.
    pub fn update(&mut self, now_ms: u32, ctx: &mut C) {
        for task in self.tasks.iter_mut() {
            if task.enabled && task.is_due(now_ms) {
                (task.work)(ctx);
                task.last_execution_ms = now_ms;
                task.execution_count = task.execution_count.wrapping_add(1);
            }
        }
    }
}

impl<C> TaskScheduler for CooperativeScheduler<C> {
    type Work = TaskFn<C>;

    fn add_task(&mut self, name: &str, work: TaskFn<C>, interval_ms: u32) -> Result<(), SchedulerError> {
        if self.tasks.is_full() {
            warn!("Scheduler: table full, '{}' not added", name);
            return Err(SchedulerError::TableFull);
        }
        if self.position(name).is_some() {
            warn!("Scheduler: '{}' already registered", name);
            return Err(SchedulerError::DuplicateName);
        }
        let entry = TaskEntry {
            name: task_name(name)?,
            work,
            interval_ms,
            last_execution_ms: 0,
            execution_count: 0,
            enabled: true,
        };
        if self.tasks.push(entry).is_err() {
            return Err(SchedulerError::TableFull);
        }
        info!("Scheduler: added '{}' every {}ms", name, interval_ms);
        Ok(())
    }

    fn remove_task(&mut self, name: &str) -> Result<(), SchedulerError> {
        let idx = self.position(name).ok_or(SchedulerError::NotFound)?;
        self.tasks.remove(idx);
        info!("Scheduler: removed '{}'", name);
        Ok(())
    }

    fn enable_task(&mut self, name: &str) -> Result<(), SchedulerError> {
        self.entry_mut(name)?.enabled = true;
        Ok(())
    }

    fn disable_task(&mut self, name: &str) -> Result<(), SchedulerError> {
        self.entry_mut(name)?.enabled = false;
        Ok(())
    }

    fn task(&self, name: &str) -> Option<TaskInfo> {
        self.tasks.iter().find(|t| t.name == name).map(TaskEntry::info)
    }

    fn task_count(&self) -> usize {
        self.tasks.len()
    }

    fn tasks(&self) -> heapless::Vec<TaskInfo, MAX_TASKS> {
        self.tasks.iter().map(TaskEntry::info).collect()
    }
}
