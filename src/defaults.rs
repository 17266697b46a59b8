//! Built-in seed data: default statuses, priorities, system tables and the
//! bootstrap admin account.

use crate::types::{
    PriorityOption, Role, StatusOption, TableCollection, TableKind, User, ViewConfig,
};

/// Well-known id of the "not started" status. Take-to-work advances tasks to
/// the first status that is not this one.
pub const STATUS_NOT_STARTED_ID: &str = "status-not-started";

/// Well-known id of the "done" status. The hide-done filter excludes tasks
/// carrying this status.
pub const STATUS_DONE_ID: &str = "status-done";

/// Id of the built-in backlog table synthesized when none is persisted.
pub const BACKLOG_TABLE_ID: &str = "table-backlog";

pub fn default_statuses() -> Vec<StatusOption> {
    vec![
        StatusOption {
            id: STATUS_NOT_STARTED_ID.to_string(),
            name: "Not started".to_string(),
            color: Some("gray".to_string()),
        },
        StatusOption {
            id: "status-in-progress".to_string(),
            name: "In progress".to_string(),
            color: Some("blue".to_string()),
        },
        StatusOption {
            id: "status-review".to_string(),
            name: "In review".to_string(),
            color: Some("amber".to_string()),
        },
        StatusOption {
            id: STATUS_DONE_ID.to_string(),
            name: "Done".to_string(),
            color: Some("green".to_string()),
        },
    ]
}

pub fn default_priorities() -> Vec<PriorityOption> {
    vec![
        PriorityOption {
            id: "prio-low".to_string(),
            name: "Low".to_string(),
            color: Some("gray".to_string()),
        },
        PriorityOption {
            id: "prio-medium".to_string(),
            name: "Medium".to_string(),
            color: Some("amber".to_string()),
        },
        PriorityOption {
            id: "prio-high".to_string(),
            name: "High".to_string(),
            color: Some("red".to_string()),
        },
    ]
}

/// The built-in backlog table. Kept system-flagged so deduplication always
/// has a canonical candidate.
pub fn backlog_table() -> TableCollection {
    TableCollection {
        id: BACKLOG_TABLE_ID.to_string(),
        name: "Backlog".to_string(),
        kind: TableKind::Backlog,
        icon: "inbox".to_string(),
        color: Some("gray".to_string()),
        view_config: None,
        is_system: true,
    }
}

pub fn default_tables() -> Vec<TableCollection> {
    vec![
        TableCollection {
            id: "table-work".to_string(),
            name: "Work".to_string(),
            kind: TableKind::Tasks,
            icon: "check-square".to_string(),
            color: Some("blue".to_string()),
            view_config: Some(ViewConfig::default()),
            is_system: true,
        },
        backlog_table(),
        TableCollection {
            id: "table-docs".to_string(),
            name: "Docs".to_string(),
            kind: TableKind::Docs,
            icon: "file-text".to_string(),
            color: Some("purple".to_string()),
            view_config: None,
            is_system: true,
        },
        TableCollection {
            id: "table-meetings".to_string(),
            name: "Meetings".to_string(),
            kind: TableKind::Meetings,
            icon: "calendar".to_string(),
            color: Some("green".to_string()),
            view_config: None,
            is_system: true,
        },
    ]
}

/// Bootstrap admin account for an empty store. Forced to change the password
/// on first login.
pub fn default_admin() -> User {
    User {
        id: "user-admin".to_string(),
        name: "Administrator".to_string(),
        login: "admin".to_string(),
        password: "admin".to_string(),
        role: Role::Admin,
        avatar: None,
        position: None,
        must_change_password: true,
    }
}
