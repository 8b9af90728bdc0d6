//! Cooperative periodic task list
//!
//! Each node loop calls [`Scheduler::poll`] once per pass with the current
//! uptime. At most one due task runs per pass so a slow action never starves
//! radio reception; tasks are considered in round-robin order starting after
//! the one that ran last.

use crate::error::Result;
use log::debug;

/// Task body: node state plus the uptime it was started at
pub type TaskAction<C> = fn(&mut C, u64) -> Result<()>;

pub struct PeriodicTask<C> {
    pub name: &'static str,
    pub interval_ms: u64,
    pub last_run_ms: u64,
    pub action: TaskAction<C>,
}

impl<C> PeriodicTask<C> {
    pub fn new(name: &'static str, interval_ms: u64, action: TaskAction<C>) -> Self {
        Self {
            name,
            interval_ms,
            last_run_ms: 0,
            action,
        }
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_run_ms) >= self.interval_ms
    }
}

impl<C> std::fmt::Debug for PeriodicTask<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeriodicTask")
            .field("name", &self.name)
            .field("interval_ms", &self.interval_ms)
            .field("last_run_ms", &self.last_run_ms)
            .finish()
    }
}

/// Outcome of one scheduler pass that ran a task
#[derive(Debug)]
pub struct TaskRun {
    pub name: &'static str,
    pub result: Result<()>,
}

#[derive(Debug)]
pub struct Scheduler<C> {
    tasks: Vec<PeriodicTask<C>>,
    cursor: usize,
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            cursor: 0,
        }
    }
}

impl<C> Scheduler<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, task: PeriodicTask<C>) -> &mut Self {
        self.tasks.push(task);
        self
    }

    pub fn tasks(&self) -> &[PeriodicTask<C>] {
        &self.tasks
    }

    /// Run the first due task, if any
    ///
    /// `last_run_ms` is stamped before the action runs, so a failing task
    /// waits a full interval like a successful one.
    pub fn poll(&mut self, ctx: &mut C, now_ms: u64) -> Option<TaskRun> {
        let count = self.tasks.len();
        let index = (0..count)
            .map(|offset| (self.cursor + offset) % count)
            .find(|&i| self.tasks[i].is_due(now_ms))?;

        let task = &mut self.tasks[index];
        task.last_run_ms = now_ms;
        self.cursor = (index + 1) % count;
        debug!("Running task '{}' at {} ms", task.name, now_ms);

        Some(TaskRun {
            name: task.name,
            result: (task.action)(ctx, now_ms),
        })
    }
}
