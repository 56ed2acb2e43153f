use super::*;
use crate::test_helpers::task;

#[test]
fn summary_of_empty_list_is_zero() {
    assert_eq!(TaskSummary::from_tasks(&[]), TaskSummary::default());
}

#[test]
fn summary_counts_each_status() {
    let tasks = vec![
        task(1, "a", TaskStatus::Pending),
        task(2, "b", TaskStatus::Pending),
        task(3, "c", TaskStatus::InProgress),
        task(4, "d", TaskStatus::Completed),
    ];
    assert_eq!(
        TaskSummary::from_tasks(&tasks),
        TaskSummary { total: 4, pending: 2, in_progress: 1, completed: 1 }
    );
}

#[test]
fn recent_caps_at_n() {
    let tasks: Vec<Task> = (1..=7).map(|id| task(id, "t", TaskStatus::Pending)).collect();
    let shown = recent(&tasks, 5);
    assert_eq!(shown.len(), 5);
    assert_eq!(shown[0].id, 1);
}

#[test]
fn recent_returns_all_when_short() {
    let tasks = vec![task(1, "t", TaskStatus::Pending)];
    assert_eq!(recent(&tasks, 5).len(), 1);
}

#[test]
fn tasks_are_prepended_on_create() {
    assert_eq!(Task::INSERT_AT, InsertAt::Front);
    assert_eq!(Task::COLLECTION, "/tasks/");
}
