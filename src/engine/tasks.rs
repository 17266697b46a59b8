//! Task actions: create, update, comment, attach, archive, take-to-work.
//!
//! Every action follows the same protocol: re-pull the remote snapshot,
//! re-read the freshest task collection from the store (never the in-memory
//! mirror), apply the mutation, write the whole collection back, mirror it,
//! and patch the open task view. Concurrent edits to unrelated tasks survive
//! this; concurrent edits to the same task resolve last-writer-wins.

use super::{new_id, Engine};
use crate::defaults::{BACKLOG_TABLE_ID, STATUS_NOT_STARTED_ID};
use crate::format::{format_new_task_message, format_status_change_message};
use crate::store::now_ms;
use crate::types::{
    Attachment, AttachmentKind, Comment, Doc, DocKind, NotificationCategory, TableKind, Task,
    TaskDraft, TaskPatch,
};
use chrono::Utc;
use tracing::{debug, info};

impl Engine {
    /// Create a task from a draft, filling unset fields with engine defaults:
    /// the active table (backlog when none is active), the first configured
    /// status and priority, and today's date range. An unset assignee stays
    /// unset. Returns the new task's id, or `None` when nobody is signed in.
    pub async fn create_task(&self, draft: TaskDraft) -> Option<String> {
        let actor = self.current_user()?;
        self.refresh().await;

        let (table_id, status_id, priority_id) = {
            let state = self.state();
            let table_id = state
                .active_table_id
                .clone()
                .unwrap_or_else(|| BACKLOG_TABLE_ID.to_string());
            let status_id = draft
                .status_id
                .clone()
                .or_else(|| state.statuses.first().map(|s| s.id.clone()))
                .unwrap_or_else(|| STATUS_NOT_STARTED_ID.to_string());
            let priority_id = draft
                .priority_id
                .clone()
                .or_else(|| state.priorities.first().map(|p| p.id.clone()))
                .unwrap_or_default();
            (table_id, status_id, priority_id)
        };

        let now = now_ms();
        let today = Utc::now().date_naive();
        let start_date = draft.start_date.unwrap_or(today);
        let task = Task {
            id: new_id("task"),
            table_id,
            title: draft.title.unwrap_or_else(|| "New task".to_string()),
            description: draft.description.unwrap_or_default(),
            status_id,
            priority_id,
            assignee_id: draft.assignee_id.clone(),
            project_id: draft.project_id.clone(),
            start_date,
            end_date: draft.end_date.unwrap_or(start_date),
            archived: false,
            comments: Vec::new(),
            attachments: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        let id = task.id.clone();
        info!(task_id = %id, title = %task.title, "Creating task");

        // Announce only tasks assigned to somebody other than the creator.
        let message = {
            let state = self.state();
            let assignee = task
                .assignee_id
                .as_deref()
                .filter(|uid| *uid != actor.id)
                .and_then(|uid| state.users.iter().find(|u| u.id == uid));
            assignee.map(|assignee| {
                let priority = state
                    .priorities
                    .iter()
                    .find(|p| p.id == task.priority_id)
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| task.priority_id.clone());
                let project = task
                    .project_id
                    .as_deref()
                    .and_then(|pid| state.projects.iter().find(|p| p.id == pid))
                    .map(|p| p.name.clone());
                format_new_task_message(
                    &task.title,
                    &priority,
                    task.end_date,
                    &assignee.name,
                    project.as_deref(),
                )
            })
        };

        let mut tasks = self.store().tasks();
        tasks.push(task.clone());
        self.persist_tasks(tasks);

        self.record_activity(
            NotificationCategory::NewTask,
            &actor,
            "created task",
            task.title.clone(),
            message,
        );
        Some(id)
    }

    /// Apply a partial update to a task. A status transition is audited and
    /// announced; all other field changes are silent.
    pub async fn update_task(&self, task_id: &str, patch: TaskPatch) {
        let Some(actor) = self.current_user() else {
            return;
        };
        self.refresh().await;

        let mut tasks = self.store().tasks();
        let Some(task) = tasks.iter_mut().find(|t| t.id == task_id) else {
            debug!(task_id, "Update target not found; dropping the edit");
            return;
        };
        let old_status = task.status_id.clone();
        patch.apply(task, now_ms());
        let updated = task.clone();
        self.persist_tasks(tasks);
        self.patch_open_task(&updated);

        if updated.status_id != old_status {
            let (from, to) = {
                let state = self.state();
                let name = |id: &str| {
                    state
                        .statuses
                        .iter()
                        .find(|s| s.id == id)
                        .map(|s| s.name.clone())
                        .unwrap_or_else(|| id.to_string())
                };
                (name(&old_status), name(&updated.status_id))
            };
            self.record_activity(
                NotificationCategory::StatusChange,
                &actor,
                "changed status",
                format!("{}: {} -> {}", updated.title, from, to),
                Some(format_status_change_message(
                    &updated.title,
                    &from,
                    &to,
                    &actor.name,
                )),
            );
        }
    }

    /// Append a comment authored by the signed-in user.
    pub async fn add_comment(&self, task_id: &str, text: &str) {
        let Some(actor) = self.current_user() else {
            return;
        };
        self.refresh().await;

        let mut tasks = self.store().tasks();
        let Some(task) = tasks.iter_mut().find(|t| t.id == task_id) else {
            debug!(task_id, "Comment target not found; dropping the comment");
            return;
        };
        task.comments.push(Comment {
            id: new_id("comment"),
            user_id: actor.id.clone(),
            user_name: actor.name.clone(),
            user_avatar: actor.avatar.clone(),
            text: text.to_string(),
            created_at: now_ms(),
        });
        task.updated_at = now_ms();
        let updated = task.clone();
        self.persist_tasks(tasks);
        self.patch_open_task(&updated);

        // The feed carries only a short snippet of the comment.
        let snippet: String = text.chars().take(20).collect();
        self.record_activity(
            NotificationCategory::NewComment,
            &actor,
            "commented on task",
            format!("{}: {}", updated.title, snippet),
            Some(format!(
                "New comment on {}\n{}\nBy: {}",
                updated.title, text, actor.name
            )),
        );
    }

    /// Attach a file reference or a link to a task. A link attachment also
    /// materializes as a link doc on the first docs table, so shared links
    /// show up in the knowledge base.
    pub async fn add_attachment(
        &self,
        task_id: &str,
        name: &str,
        kind: AttachmentKind,
        url: Option<String>,
    ) {
        let Some(actor) = self.current_user() else {
            return;
        };
        self.refresh().await;

        let mut tasks = self.store().tasks();
        let Some(task) = tasks.iter_mut().find(|t| t.id == task_id) else {
            debug!(task_id, "Attachment target not found");
            return;
        };
        task.attachments.push(Attachment {
            id: new_id("attachment"),
            name: name.to_string(),
            kind,
            url: url.clone(),
            created_at: now_ms(),
        });
        task.updated_at = now_ms();
        let updated = task.clone();
        self.persist_tasks(tasks);
        self.patch_open_task(&updated);

        if kind == AttachmentKind::Link {
            let doc_table = {
                let state = self.state();
                state
                    .tables
                    .iter()
                    .find(|t| t.kind == TableKind::Docs)
                    .map(|t| t.id.clone())
            };
            if let Some(table_id) = doc_table {
                let mut docs = self.store().docs();
                docs.push(Doc {
                    id: new_id("doc"),
                    table_id,
                    folder_id: None,
                    title: name.to_string(),
                    kind: DocKind::Link,
                    url,
                    content: String::new(),
                    tags: vec!["From tasks".to_string()],
                });
                self.persist_docs(docs);
                self.record_activity(
                    NotificationCategory::NewDoc,
                    &actor,
                    "shared link",
                    name.to_string(),
                    None,
                );
            }
        }
    }

    pub async fn delete_attachment(&self, task_id: &str, attachment_id: &str) {
        self.refresh().await;
        let mut tasks = self.store().tasks();
        let Some(task) = tasks.iter_mut().find(|t| t.id == task_id) else {
            return;
        };
        task.attachments.retain(|a| a.id != attachment_id);
        task.updated_at = now_ms();
        let updated = task.clone();
        self.persist_tasks(tasks);
        self.patch_open_task(&updated);
    }

    /// Soft-delete: the task stays in the collection and drops out of every
    /// filtered view.
    pub async fn archive_task(&self, task_id: &str) {
        self.update_task(task_id, TaskPatch::archived(true)).await;
        let mut state = self.state();
        if state.open_task.as_ref().is_some_and(|t| t.id == task_id) {
            state.open_task = None;
        }
    }

    pub async fn restore_task(&self, task_id: &str) {
        self.update_task(task_id, TaskPatch::archived(false)).await;
    }

    /// Hard-delete a task from the collection. Irreversible.
    pub async fn delete_task_permanently(&self, task_id: &str) {
        self.refresh().await;
        let mut tasks = self.store().tasks();
        tasks.retain(|t| t.id != task_id);
        self.persist_tasks(tasks);

        let mut state = self.state();
        if state.open_task.as_ref().is_some_and(|t| t.id == task_id) {
            state.open_task = None;
        }
    }

    /// Pull a backlog task into active work: move it to a tasks table other
    /// than its current one, assign it to the acting user, and advance it to
    /// the first status that is not "not started". The whole change goes
    /// through [`Engine::update_task`] as one partial update, so the status
    /// transition is audited and announced like any other. When no tasks
    /// table exists the task is left untouched; when no advanceable status is
    /// configured the status stays unchanged.
    pub async fn take_to_work(&self, task_id: &str) {
        let Some(actor) = self.current_user() else {
            return;
        };
        self.refresh().await;

        let tasks = self.store().tasks();
        let current_table = tasks
            .iter()
            .find(|t| t.id == task_id)
            .map(|t| t.table_id.clone());
        let (target_table, target_status) = {
            let state = self.state();
            let target_table = state
                .tables
                .iter()
                .filter(|t| t.kind == TableKind::Tasks)
                .find(|t| Some(&t.id) != current_table.as_ref())
                .or_else(|| state.tables.iter().find(|t| t.kind == TableKind::Tasks))
                .map(|t| t.id.clone());
            let target_status = state
                .statuses
                .iter()
                .find(|s| s.id != STATUS_NOT_STARTED_ID)
                .map(|s| s.id.clone());
            (target_table, target_status)
        };
        let Some(table_id) = target_table else {
            debug!(task_id, "No tasks table to take the task into");
            return;
        };

        info!(task_id, table_id = %table_id, "Taking task to work");
        self.update_task(
            task_id,
            TaskPatch {
                table_id: Some(table_id),
                assignee_id: Some(Some(actor.id.clone())),
                status_id: target_status,
                ..TaskPatch::default()
            },
        )
        .await;
    }

    /// Mirror a freshly written task into the open detail view.
    fn patch_open_task(&self, updated: &Task) {
        let mut state = self.state();
        if state.open_task.as_ref().is_some_and(|t| t.id == updated.id) {
            state.open_task = Some(updated.clone());
        }
    }
}
