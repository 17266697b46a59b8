//! Pure task filtering for the list/kanban/gantt views.

use crate::defaults::STATUS_DONE_ID;
use crate::types::Task;

/// Active filter criteria. All predicates are ANDed; there is no OR
/// semantics and no ranking.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Case-insensitive substring match on the title.
    pub search: String,
    pub status_id: Option<String>,
    pub assignee_id: Option<String>,
    pub project_id: Option<String>,
    /// Exclude tasks carrying the done-sentinel status.
    pub hide_done: bool,
}

/// Select the visible task subset. Archived tasks are excluded
/// unconditionally; a set active table restricts to that table. Result order
/// is the collection's insertion order.
pub fn filter_tasks<'a>(
    tasks: &'a [Task],
    active_table_id: Option<&str>,
    filter: &TaskFilter,
) -> Vec<&'a Task> {
    let search = filter.search.to_lowercase();
    tasks
        .iter()
        .filter(|t| {
            if t.archived {
                return false;
            }
            if let Some(table_id) = active_table_id {
                if t.table_id != table_id {
                    return false;
                }
            }
            if filter.hide_done && t.status_id == STATUS_DONE_ID {
                return false;
            }
            if !search.is_empty() && !t.title.to_lowercase().contains(&search) {
                return false;
            }
            if let Some(ref status_id) = filter.status_id {
                if t.status_id != *status_id {
                    return false;
                }
            }
            if let Some(ref assignee_id) = filter.assignee_id {
                if t.assignee_id.as_deref() != Some(assignee_id.as_str()) {
                    return false;
                }
            }
            if let Some(ref project_id) = filter.project_id {
                if t.project_id.as_deref() != Some(project_id.as_str()) {
                    return false;
                }
            }
            true
        })
        .collect()
}
