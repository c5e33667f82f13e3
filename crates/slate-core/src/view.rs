use std::cmp::Ordering;

use crate::tabs::{SortBy, SortOrder, Tab};
use crate::task::Task;

/// Projects the subsequence of `tasks` matching a tab's filters.
/// Pure; relative order of matching tasks is preserved.
#[must_use]
pub fn filter_tasks(tasks: &[Task], tab: &Tab) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| {
            tab.status_filter.contains(&task.status)
                && tab.priority_filter.contains(&task.priority)
        })
        .cloned()
        .collect()
}

/// Returns a newly ordered copy of `tasks`; the input is never
/// mutated. Unspecified key and order fall back to most recently
/// updated first.
///
/// Under a `CompletedAt` sort, tasks with no completion time sort
/// after completed ones regardless of direction.
#[must_use]
pub fn sort_tasks(
    tasks: &[Task],
    sort_by: Option<SortBy>,
    sort_order: Option<SortOrder>,
) -> Vec<Task> {
    let sort_by = sort_by.unwrap_or_default();
    let sort_order = sort_order.unwrap_or_default();

    let mut out = tasks.to_vec();
    out.sort_by(|a, b| match sort_by {
        SortBy::Priority => directed(a.priority.cmp(&b.priority), sort_order),
        SortBy::Status => directed(a.status.label().cmp(b.status.label()), sort_order),
        SortBy::CreatedAt => directed(a.created_at.cmp(&b.created_at), sort_order),
        SortBy::UpdatedAt => directed(a.updated_at.cmp(&b.updated_at), sort_order),
        SortBy::CompletedAt => match (a.completed_at, b.completed_at) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => directed(x.cmp(&y), sort_order),
        },
        // Unknown key: always-equal comparison, stable sort keeps
        // the input order.
        SortBy::Unsorted => Ordering::Equal,
    });
    out
}

fn directed(ord: Ordering, sort_order: SortOrder) -> Ordering {
    match sort_order {
        SortOrder::Asc => ord,
        SortOrder::Desc => ord.reverse(),
    }
}
