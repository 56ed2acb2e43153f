//! Task list store and dashboard counters.

#[cfg(test)]
#[path = "tasks_test.rs"]
mod tasks_test;

use crate::net::types::{NewTask, Task, TaskPatch, TaskStatus};
use crate::state::resource::{InsertAt, Resource, ResourceStore};

impl Resource for Task {
    type Create = NewTask;
    type Patch = TaskPatch;

    const COLLECTION: &'static str = "/tasks/";
    const FETCH_FALLBACK: &'static str = "Failed to fetch tasks";
    // Server lists newest first.
    const INSERT_AT: InsertAt = InsertAt::Front;

    fn id(&self) -> i64 {
        self.id
    }
}

pub type TasksStore = ResourceStore<Task>;

/// Status counters shown on the dashboard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TaskSummary {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl TaskSummary {
    #[must_use]
    pub fn from_tasks(tasks: &[Task]) -> Self {
        tasks.iter().fold(Self::default(), |mut summary, task| {
            summary.total += 1;
            match task.status {
                TaskStatus::Pending => summary.pending += 1,
                TaskStatus::InProgress => summary.in_progress += 1,
                TaskStatus::Completed => summary.completed += 1,
            }
            summary
        })
    }
}

/// The first `n` tasks in list order (newest first as served).
#[must_use]
pub fn recent(tasks: &[Task], n: usize) -> &[Task] {
    &tasks[..tasks.len().min(n)]
}
