//! Storage adapter layer.
//!
//! A [`Store`] keeps a local cache of every workspace collection and mirrors
//! it to a backing store. `load()` refreshes the cache from the remote side
//! and signals failure by returning `false` -- it never errors out, so callers
//! can always fall back to the stale cache. Collection writes are
//! whole-collection overwrites, not incremental patches.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::types::{
    ActivityLog, Doc, Folder, Meeting, NotificationSettings, PriorityOption, Project, StatusOption,
    TableCollection, Task, User,
};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Every collection the workspace persists, bundled for snapshot transfer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Collections {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub tables: Vec<TableCollection>,
    #[serde(default)]
    pub docs: Vec<Doc>,
    #[serde(default)]
    pub folders: Vec<Folder>,
    #[serde(default)]
    pub meetings: Vec<Meeting>,
    #[serde(default)]
    pub activities: Vec<ActivityLog>,
    #[serde(default)]
    pub statuses: Vec<StatusOption>,
    #[serde(default)]
    pub priorities: Vec<PriorityOption>,
}

impl Collections {
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
            && self.tasks.is_empty()
            && self.projects.is_empty()
            && self.tables.is_empty()
            && self.docs.is_empty()
            && self.folders.is_empty()
            && self.meetings.is_empty()
            && self.activities.is_empty()
            && self.statuses.is_empty()
            && self.priorities.is_empty()
    }
}

/// Storage adapter consumed by the reconciliation engine.
///
/// Reads return the adapter's current cache; they do not touch the remote
/// side. Only `load()` suspends, which keeps the engine's cooperative
/// interleaving model down to a single kind of suspension point.
#[async_trait]
pub trait Store: Send + Sync {
    /// Refresh the cache from the remote source. Returns `false` on failure
    /// (network, parse, ...) without touching the cache. Safe to call
    /// repeatedly.
    async fn load(&self) -> bool;

    fn users(&self) -> Vec<User>;
    fn set_users(&self, users: &[User]) -> Result<()>;

    fn tasks(&self) -> Vec<Task>;
    fn set_tasks(&self, tasks: &[Task]) -> Result<()>;

    fn projects(&self) -> Vec<Project>;
    fn set_projects(&self, projects: &[Project]) -> Result<()>;

    fn tables(&self) -> Vec<TableCollection>;
    fn set_tables(&self, tables: &[TableCollection]) -> Result<()>;

    fn docs(&self) -> Vec<Doc>;
    fn set_docs(&self, docs: &[Doc]) -> Result<()>;

    fn folders(&self) -> Vec<Folder>;
    fn set_folders(&self, folders: &[Folder]) -> Result<()>;

    fn meetings(&self) -> Vec<Meeting>;
    fn set_meetings(&self, meetings: &[Meeting]) -> Result<()>;

    fn activities(&self) -> Vec<ActivityLog>;
    fn set_activities(&self, activities: &[ActivityLog]) -> Result<()>;

    fn statuses(&self) -> Vec<StatusOption>;
    fn set_statuses(&self, statuses: &[StatusOption]) -> Result<()>;

    fn priorities(&self) -> Vec<PriorityOption>;
    fn set_priorities(&self, priorities: &[PriorityOption]) -> Result<()>;

    /// Append one activity entry and return the updated collection.
    fn add_activity(&self, entry: ActivityLog) -> Result<Vec<ActivityLog>>;

    /// Per-category notification channel gates.
    fn notification_settings(&self) -> NotificationSettings;

    /// Snapshot of every collection, for export and emptiness checks.
    fn collections(&self) -> Collections {
        Collections {
            users: self.users(),
            tasks: self.tasks(),
            projects: self.projects(),
            tables: self.tables(),
            docs: self.docs(),
            folders: self.folders(),
            meetings: self.meetings(),
            activities: self.activities(),
            statuses: self.statuses(),
            priorities: self.priorities(),
        }
    }

    /// Replace every collection from a snapshot.
    fn set_collections(&self, collections: &Collections) -> Result<()> {
        self.set_users(&collections.users)?;
        self.set_tasks(&collections.tasks)?;
        self.set_projects(&collections.projects)?;
        self.set_tables(&collections.tables)?;
        self.set_docs(&collections.docs)?;
        self.set_folders(&collections.folders)?;
        self.set_meetings(&collections.meetings)?;
        self.set_activities(&collections.activities)?;
        self.set_statuses(&collections.statuses)?;
        self.set_priorities(&collections.priorities)?;
        Ok(())
    }
}

/// Get the current timestamp in milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
