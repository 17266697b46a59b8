//! Message templates for outbound notifications.

use chrono::NaiveDate;

/// Message announcing a newly created task to its assignee's channel.
pub fn format_new_task_message(
    title: &str,
    priority: &str,
    due: NaiveDate,
    assignee: &str,
    project: Option<&str>,
) -> String {
    let mut msg = format!(
        "New task: {}\nPriority: {}\nDue: {}\nAssignee: {}",
        title, priority, due, assignee
    );
    if let Some(project) = project {
        msg.push_str(&format!("\nProject: {}", project));
    }
    msg
}

/// Message announcing a status transition.
pub fn format_status_change_message(title: &str, from: &str, to: &str, actor: &str) -> String {
    format!("Status changed: {}\n{} -> {}\nBy: {}", title, from, to, actor)
}
