//! Core entity types for the workdeck state engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// User role within the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    #[default]
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Member => "member",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "member" => Some(Role::Member),
            _ => None,
        }
    }
}

/// A workspace user.
///
/// Credentials are stored in plaintext; auth is a plain login/password match
/// against the mirrored user collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub login: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    pub avatar: Option<String>,
    pub position: Option<String>,
    /// Forces the password-change flow on first login.
    #[serde(default)]
    pub must_change_password: bool,
}

/// A project tag that tasks can reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
}

/// A configurable task status. Tasks reference statuses by id, so renaming a
/// status never breaks references. Two ids are well known: see
/// [`crate::defaults::STATUS_NOT_STARTED_ID`] and
/// [`crate::defaults::STATUS_DONE_ID`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusOption {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
}

/// A configurable task priority, referenced by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityOption {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
}

/// A comment on a task. Append-only; never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub user_avatar: Option<String>,
    pub text: String,
    pub created_at: i64,
}

/// Kind of task attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    File,
    Link,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentKind::File => "file",
            AttachmentKind::Link => "link",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "file" => Some(AttachmentKind::File),
            "link" => Some(AttachmentKind::Link),
            _ => None,
        }
    }
}

/// An attachment on a task. Appended or removed by id, never edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub name: String,
    pub kind: AttachmentKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub created_at: i64,
}

/// A task in the workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    /// Owning table collection.
    pub table_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status_id: String,
    pub priority_id: String,
    pub assignee_id: Option<String>,
    pub project_id: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Soft-delete flag; archived tasks stay in the collection.
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for creating a task. Unset fields fall back to engine defaults.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status_id: Option<String>,
    pub priority_id: Option<String>,
    pub assignee_id: Option<String>,
    pub project_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Partial update for a task. `None` leaves a field untouched; the nested
/// options for assignee/project distinguish "clear" from "keep".
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub table_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status_id: Option<String>,
    pub priority_id: Option<String>,
    pub assignee_id: Option<Option<String>>,
    pub project_id: Option<Option<String>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub archived: Option<bool>,
}

impl TaskPatch {
    /// Apply this patch to a task, bumping `updated_at`.
    pub fn apply(&self, task: &mut Task, now: i64) {
        if let Some(ref v) = self.table_id {
            task.table_id = v.clone();
        }
        if let Some(ref v) = self.title {
            task.title = v.clone();
        }
        if let Some(ref v) = self.description {
            task.description = v.clone();
        }
        if let Some(ref v) = self.status_id {
            task.status_id = v.clone();
        }
        if let Some(ref v) = self.priority_id {
            task.priority_id = v.clone();
        }
        if let Some(ref v) = self.assignee_id {
            task.assignee_id = v.clone();
        }
        if let Some(ref v) = self.project_id {
            task.project_id = v.clone();
        }
        if let Some(v) = self.start_date {
            task.start_date = v;
        }
        if let Some(v) = self.end_date {
            task.end_date = v;
        }
        if let Some(v) = self.archived {
            task.archived = v;
        }
        task.updated_at = now;
    }

    pub fn archived(value: bool) -> Self {
        Self {
            archived: Some(value),
            ..Self::default()
        }
    }
}

/// Kind of a table collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Tasks,
    Docs,
    Meetings,
    Backlog,
}

impl TableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Tasks => "tasks",
            TableKind::Docs => "docs",
            TableKind::Meetings => "meetings",
            TableKind::Backlog => "backlog",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "tasks" => Some(TableKind::Tasks),
            "docs" => Some(TableKind::Docs),
            "meetings" => Some(TableKind::Meetings),
            "backlog" => Some(TableKind::Backlog),
            _ => None,
        }
    }
}

/// Which sub-views a tasks table exposes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ViewConfig {
    pub show_table: bool,
    pub show_kanban: bool,
    pub show_gantt: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            show_table: true,
            show_kanban: true,
            show_gantt: true,
        }
    }
}

/// Sub-view of a tasks table. The fallback preference order when a mode is
/// disabled is table, then kanban, then gantt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Table,
    Kanban,
    Gantt,
}

impl ViewMode {
    /// Whether this mode is enabled under the given view config.
    pub fn enabled_in(&self, config: &ViewConfig) -> bool {
        match self {
            ViewMode::Table => config.show_table,
            ViewMode::Kanban => config.show_kanban,
            ViewMode::Gantt => config.show_gantt,
        }
    }

    /// First enabled mode in preference order, if any.
    pub fn first_enabled(config: &ViewConfig) -> Option<ViewMode> {
        [ViewMode::Table, ViewMode::Kanban, ViewMode::Gantt]
            .into_iter()
            .find(|m| m.enabled_in(config))
    }
}

/// A table collection: a navigable grouping of tasks, docs or meetings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableCollection {
    pub id: String,
    pub name: String,
    pub kind: TableKind,
    pub icon: String,
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_config: Option<ViewConfig>,
    /// System tables survive backlog deduplication and mark built-ins.
    #[serde(default)]
    pub is_system: bool,
}

/// Kind of document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocKind {
    Internal,
    Link,
}

impl DocKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocKind::Internal => "internal",
            DocKind::Link => "link",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "internal" => Some(DocKind::Internal),
            "link" => Some(DocKind::Link),
            _ => None,
        }
    }
}

/// A document owned by a table, optionally filed under a folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doc {
    pub id: String,
    pub table_id: String,
    pub folder_id: Option<String>,
    pub title: String,
    pub kind: DocKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Input for creating a document.
#[derive(Debug, Clone)]
pub struct DocDraft {
    pub title: String,
    pub kind: DocKind,
    pub url: Option<String>,
    pub content: String,
    pub tags: Vec<String>,
    pub folder_id: Option<String>,
}

/// A folder for grouping docs inside a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    pub name: String,
    pub table_id: String,
}

/// A meeting entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub id: String,
    pub table_id: String,
    pub title: String,
    pub starts_at: i64,
    #[serde(default)]
    pub participant_ids: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

/// An append-only audit entry. Only the `read` flag is ever mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub user_avatar: Option<String>,
    pub action: String,
    pub details: String,
    pub timestamp: i64,
    #[serde(default)]
    pub read: bool,
}

/// Category of activity that can be gated per notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationCategory {
    NewTask,
    StatusChange,
    NewComment,
    NewDoc,
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::NewTask => "NEW_TASK",
            NotificationCategory::StatusChange => "STATUS_CHANGE",
            NotificationCategory::NewComment => "NEW_COMMENT",
            NotificationCategory::NewDoc => "NEW_DOC",
        }
    }
}

/// Per-category channel gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSetting {
    pub system: bool,
    pub telegram: bool,
}

/// Mapping from category to its channel gates.
pub type NotificationSettings = HashMap<NotificationCategory, NotificationSetting>;

/// Whether an internal activity entry should be recorded for a category.
/// A missing category counts as enabled.
pub fn system_enabled(settings: &NotificationSettings, category: NotificationCategory) -> bool {
    settings.get(&category).map(|s| s.system).unwrap_or(true)
}

/// Whether an external notification should be dispatched for a category.
/// A missing category counts as disabled.
pub fn telegram_enabled(settings: &NotificationSettings, category: NotificationCategory) -> bool {
    settings.get(&category).map(|s| s.telegram).unwrap_or(false)
}
