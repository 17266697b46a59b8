//! In-memory store with a shareable remote half.
//!
//! The remote side is an `Arc<Mutex<Collections>>` that several stores can
//! share, which models multiple clients syncing against the same cloud
//! document. A failure switch turns `load()` into a no-op returning `false`,
//! modelling a degraded network.

use super::{Collections, Store};
use crate::types::{
    ActivityLog, Doc, Folder, Meeting, NotificationSettings, PriorityOption, Project, StatusOption,
    TableCollection, Task, User,
};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Shared remote half of one or more [`MemoryStore`]s.
pub type SharedRemote = Arc<Mutex<Collections>>;

pub struct MemoryStore {
    remote: SharedRemote,
    cache: Mutex<Collections>,
    settings: Mutex<NotificationSettings>,
    fail_loads: AtomicBool,
}

impl MemoryStore {
    /// Create a store with its own empty remote.
    pub fn new() -> Self {
        Self::with_remote(Arc::new(Mutex::new(Collections::default())))
    }

    /// Create a store attached to an existing remote. The cache starts from
    /// the remote's current contents.
    pub fn with_remote(remote: SharedRemote) -> Self {
        let cache = remote.lock().unwrap().clone();
        Self {
            remote,
            cache: Mutex::new(cache),
            settings: Mutex::new(NotificationSettings::new()),
            fail_loads: AtomicBool::new(false),
        }
    }

    /// Handle to the remote half, for sharing with another store or mutating
    /// it directly in tests.
    pub fn remote(&self) -> SharedRemote {
        Arc::clone(&self.remote)
    }

    /// Make subsequent `load()` calls fail without touching the cache.
    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::Relaxed);
    }

    /// Replace the notification settings served by this store.
    pub fn set_notification_settings(&self, settings: NotificationSettings) {
        *self.settings.lock().unwrap() = settings;
    }

    fn write<F>(&self, f: F) -> Result<()>
    where
        F: Fn(&mut Collections),
    {
        f(&mut self.cache.lock().unwrap());
        f(&mut self.remote.lock().unwrap());
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load(&self) -> bool {
        if self.fail_loads.load(Ordering::Relaxed) {
            return false;
        }
        let snapshot = self.remote.lock().unwrap().clone();
        *self.cache.lock().unwrap() = snapshot;
        true
    }

    fn users(&self) -> Vec<User> {
        self.cache.lock().unwrap().users.clone()
    }

    fn set_users(&self, users: &[User]) -> Result<()> {
        self.write(|c| c.users = users.to_vec())
    }

    fn tasks(&self) -> Vec<Task> {
        self.cache.lock().unwrap().tasks.clone()
    }

    fn set_tasks(&self, tasks: &[Task]) -> Result<()> {
        self.write(|c| c.tasks = tasks.to_vec())
    }

    fn projects(&self) -> Vec<Project> {
        self.cache.lock().unwrap().projects.clone()
    }

    fn set_projects(&self, projects: &[Project]) -> Result<()> {
        self.write(|c| c.projects = projects.to_vec())
    }

    fn tables(&self) -> Vec<TableCollection> {
        self.cache.lock().unwrap().tables.clone()
    }

    fn set_tables(&self, tables: &[TableCollection]) -> Result<()> {
        self.write(|c| c.tables = tables.to_vec())
    }

    fn docs(&self) -> Vec<Doc> {
        self.cache.lock().unwrap().docs.clone()
    }

    fn set_docs(&self, docs: &[Doc]) -> Result<()> {
        self.write(|c| c.docs = docs.to_vec())
    }

    fn folders(&self) -> Vec<Folder> {
        self.cache.lock().unwrap().folders.clone()
    }

    fn set_folders(&self, folders: &[Folder]) -> Result<()> {
        self.write(|c| c.folders = folders.to_vec())
    }

    fn meetings(&self) -> Vec<Meeting> {
        self.cache.lock().unwrap().meetings.clone()
    }

    fn set_meetings(&self, meetings: &[Meeting]) -> Result<()> {
        self.write(|c| c.meetings = meetings.to_vec())
    }

    fn activities(&self) -> Vec<ActivityLog> {
        self.cache.lock().unwrap().activities.clone()
    }

    fn set_activities(&self, activities: &[ActivityLog]) -> Result<()> {
        self.write(|c| c.activities = activities.to_vec())
    }

    fn statuses(&self) -> Vec<StatusOption> {
        self.cache.lock().unwrap().statuses.clone()
    }

    fn set_statuses(&self, statuses: &[StatusOption]) -> Result<()> {
        self.write(|c| c.statuses = statuses.to_vec())
    }

    fn priorities(&self) -> Vec<PriorityOption> {
        self.cache.lock().unwrap().priorities.clone()
    }

    fn set_priorities(&self, priorities: &[PriorityOption]) -> Result<()> {
        self.write(|c| c.priorities = priorities.to_vec())
    }

    fn add_activity(&self, entry: ActivityLog) -> Result<Vec<ActivityLog>> {
        self.write(|c| c.activities.push(entry.clone()))?;
        Ok(self.activities())
    }

    fn notification_settings(&self) -> NotificationSettings {
        self.settings.lock().unwrap().clone()
    }
}
