//! Reconciliation engine.
//!
//! The engine owns the in-memory mirror of every remote-persisted collection
//! and mediates all mutations through a pull-merge-write cycle: re-pull the
//! remote snapshot, re-read the freshest collection from the store, apply the
//! mutation, write the merged collection back, and mirror it into state.
//!
//! Consistency level: last-writer-wins per action's field set. Two clients
//! editing the same task concurrently race between the re-read and the
//! write-back; the later write wins for the fields it touches. There is no
//! locking and no versioning -- this is the documented design limit, not a
//! bug.
//!
//! Critical sections on the state mutex never span an await; the only
//! suspension points are remote pulls, so action segments interleave
//! cooperatively exactly at those pulls.

mod activity;
mod auth;
mod docs;
mod tables;
mod tasks;

use crate::defaults;
use crate::filter::{filter_tasks, TaskFilter};
use crate::notify::Notifier;
use crate::session::SessionStore;
use crate::store::Store;
use crate::types::{
    ActivityLog, Doc, Folder, Meeting, PriorityOption, Project, StatusOption, TableCollection,
    Task, User, ViewMode,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Top-level view the presentation layer is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    #[default]
    Home,
    Inbox,
    Search,
    Table,
    DocEditor,
}

/// The entire application state, owned by the engine. The presentation layer
/// reads snapshots and routes every mutation through engine methods; nothing
/// outside the engine mutates a collection in place.
#[derive(Debug, Default)]
pub struct AppState {
    pub loading: bool,
    pub current_user: Option<User>,
    pub dark_mode: bool,

    // Mirrors of the remote-persisted collections.
    pub users: Vec<User>,
    pub tasks: Vec<Task>,
    pub projects: Vec<Project>,
    pub tables: Vec<TableCollection>,
    pub docs: Vec<Doc>,
    pub folders: Vec<Folder>,
    pub meetings: Vec<Meeting>,
    pub activities: Vec<ActivityLog>,
    pub statuses: Vec<StatusOption>,
    pub priorities: Vec<PriorityOption>,

    // Navigation and view state.
    pub current_view: ViewKind,
    pub active_table_id: Option<String>,
    pub active_doc_id: Option<String>,
    pub view_mode: ViewMode,
    pub filter: TaskFilter,

    /// Task currently open in a detail view; patched in place by the poll and
    /// by mutations so an open modal tracks remote changes.
    pub open_task: Option<Task>,

    // Auth surface.
    pub auth_error: Option<String>,
    pub change_password_mode: bool,
    pub pending_login: Option<String>,
}

pub struct Engine {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    session: SessionStore,
    state: Mutex<AppState>,
    /// Poked whenever the active table, the table list, the current user or
    /// the open task identity changes; restarts the poll interval.
    rearm: Notify,
    poll_interval: Duration,
}

impl Engine {
    pub fn new(
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        session: SessionStore,
        poll_interval: Duration,
    ) -> Self {
        Self {
            store,
            notifier,
            session,
            state: Mutex::new(AppState {
                loading: true,
                ..AppState::default()
            }),
            rearm: Notify::new(),
            poll_interval,
        }
    }

    /// Direct access to the state. Callers must not hold the guard across an
    /// await.
    pub fn state(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap()
    }

    pub(crate) fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub(crate) fn notifier(&self) -> Arc<dyn Notifier> {
        Arc::clone(&self.notifier)
    }

    pub(crate) fn session(&self) -> &SessionStore {
        &self.session
    }

    pub(crate) fn poke(&self) {
        self.rearm.notify_waiters();
    }

    /// Pull the remote snapshot into the store cache. A failed pull degrades
    /// to the stale cache and is never surfaced past a warning.
    pub(crate) async fn refresh(&self) -> bool {
        let ok = self.store.load().await;
        if !ok {
            warn!("Remote pull failed; continuing with cached data");
        }
        ok
    }

    /// Initialize the engine: pull remote state, bootstrap the table list,
    /// restore the session marker, and pick the initial active table.
    pub async fn init(&self) {
        self.refresh().await;

        let users = self.store.users();
        let tasks = self.store.tasks();
        let projects = self.store.projects();
        let tables = tables::bootstrap_tables(self.store.tables());
        let docs = self.store.docs();
        let folders = self.store.folders();
        let meetings = self.store.meetings();
        let activities = self.store.activities();
        let mut statuses = self.store.statuses();
        let mut priorities = self.store.priorities();
        if statuses.is_empty() {
            statuses = defaults::default_statuses();
        }
        if priorities.is_empty() {
            priorities = defaults::default_priorities();
        }

        let restored = self
            .session
            .user_id()
            .and_then(|uid| users.iter().find(|u| u.id == uid).cloned());
        if let Some(ref user) = restored {
            info!(user = %user.login, "Session restored from marker");
        }
        let dark_mode = self.session.dark_mode();

        {
            let mut state = self.state();
            state.users = users;
            state.tasks = tasks;
            state.projects = projects;
            state.tables = tables;
            state.docs = docs;
            state.folders = folders;
            state.meetings = meetings;
            state.activities = activities;
            state.statuses = statuses;
            state.priorities = priorities;
            state.current_user = restored;
            state.dark_mode = dark_mode;
            state.loading = false;
        }

        self.auto_select_table();
        self.poke();
    }

    /// Apply one background poll tick: pull remote state and overwrite the
    /// in-memory tasks, activity log and docs unconditionally, then patch the
    /// open task so a detail view tracks remote edits.
    pub async fn poll_once(&self) {
        if !self.store.load().await {
            debug!("Background poll failed; keeping in-memory state");
            return;
        }
        let tasks = self.store.tasks();
        let activities = self.store.activities();
        let docs = self.store.docs();

        let mut state = self.state();
        if let Some(ref mut open) = state.open_task {
            if let Some(fresh) = tasks.iter().find(|t| t.id == open.id) {
                open.comments = fresh.comments.clone();
                open.attachments = fresh.attachments.clone();
                open.status_id = fresh.status_id.clone();
            }
        }
        state.tasks = tasks;
        state.activities = activities;
        state.docs = docs;
    }

    /// Spawn the background poll loop. The interval restarts whenever the
    /// poll dependencies change (active table, table list, user, open task);
    /// polling is suspended while nobody is signed in. Dropping the handle
    /// does not cancel an in-flight pull, only the timer.
    pub fn spawn_poller(self: &Arc<Self>) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(engine.poll_interval) => {
                        let signed_in = engine.state().current_user.is_some();
                        if signed_in {
                            engine.poll_once().await;
                        }
                    }
                    _ = engine.rearm.notified() => {
                        // Dependency changed: restart the interval.
                    }
                }
            }
        })
    }

    // -- Presentation-facing view/navigation surface ------------------------

    pub fn current_user(&self) -> Option<User> {
        self.state().current_user.clone()
    }

    /// Visible task subset under the active table and filters.
    pub fn filtered_tasks(&self) -> Vec<Task> {
        let state = self.state();
        filter_tasks(&state.tasks, state.active_table_id.as_deref(), &state.filter)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn navigate(&self, view: ViewKind) {
        self.state().current_view = view;
    }

    pub fn set_view_mode(&self, mode: ViewMode) {
        self.state().view_mode = mode;
    }

    pub fn set_search(&self, search: impl Into<String>) {
        self.state().filter.search = search.into();
    }

    pub fn set_status_filter(&self, status_id: Option<String>) {
        self.state().filter.status_id = status_id;
    }

    pub fn set_assignee_filter(&self, assignee_id: Option<String>) {
        self.state().filter.assignee_id = assignee_id;
    }

    pub fn set_project_filter(&self, project_id: Option<String>) {
        self.state().filter.project_id = project_id;
    }

    pub fn set_hide_done(&self, hide: bool) {
        self.state().filter.hide_done = hide;
    }

    pub fn set_dark_mode(&self, dark: bool) {
        self.state().dark_mode = dark;
        self.session.set_dark_mode(dark);
    }

    /// Open a task detail view. Returns false for an unknown id.
    pub fn open_task(&self, task_id: &str) -> bool {
        let opened = {
            let mut state = self.state();
            let task = state.tasks.iter().find(|t| t.id == task_id).cloned();
            state.open_task = task;
            state.open_task.is_some()
        };
        if opened {
            self.poke();
        }
        opened
    }

    pub fn close_task(&self) {
        self.state().open_task = None;
        self.poke();
    }

    pub fn open_doc(&self, doc_id: &str) {
        let mut state = self.state();
        state.active_doc_id = Some(doc_id.to_string());
        state.current_view = ViewKind::DocEditor;
    }

    // -- Settings collections (mirror + persist, no reconcile) --------------

    pub fn update_users(&self, users: Vec<User>) {
        if let Err(e) = self.store.set_users(&users) {
            error!(error = %e, "Failed to persist users");
        }
        self.state().users = users;
    }

    pub fn update_projects(&self, projects: Vec<Project>) {
        if let Err(e) = self.store.set_projects(&projects) {
            error!(error = %e, "Failed to persist projects");
        }
        self.state().projects = projects;
    }

    pub fn update_statuses(&self, statuses: Vec<StatusOption>) {
        if let Err(e) = self.store.set_statuses(&statuses) {
            error!(error = %e, "Failed to persist statuses");
        }
        self.state().statuses = statuses;
    }

    pub fn update_priorities(&self, priorities: Vec<PriorityOption>) {
        if let Err(e) = self.store.set_priorities(&priorities) {
            error!(error = %e, "Failed to persist priorities");
        }
        self.state().priorities = priorities;
    }

    // -- Internal persistence helpers ---------------------------------------

    /// Persist a merged task collection and mirror it into state. A failed
    /// write is logged and the in-memory mirror still advances: the next
    /// successful pull re-converges.
    pub(crate) fn persist_tasks(&self, tasks: Vec<Task>) {
        if let Err(e) = self.store.set_tasks(&tasks) {
            error!(error = %e, "Failed to persist tasks");
        }
        self.state().tasks = tasks;
    }

    pub(crate) fn persist_docs(&self, docs: Vec<Doc>) {
        if let Err(e) = self.store.set_docs(&docs) {
            error!(error = %e, "Failed to persist docs");
        }
        self.state().docs = docs;
    }

    pub(crate) fn persist_folders(&self, folders: Vec<Folder>) {
        if let Err(e) = self.store.set_folders(&folders) {
            error!(error = %e, "Failed to persist folders");
        }
        self.state().folders = folders;
    }

    pub(crate) fn persist_meetings(&self, meetings: Vec<Meeting>) {
        if let Err(e) = self.store.set_meetings(&meetings) {
            error!(error = %e, "Failed to persist meetings");
        }
        self.state().meetings = meetings;
    }

    pub(crate) fn persist_tables(&self, tables: Vec<TableCollection>) {
        if let Err(e) = self.store.set_tables(&tables) {
            error!(error = %e, "Failed to persist tables");
        }
        self.state().tables = tables;
        self.poke();
    }
}

/// Generate a prefixed entity id.
pub(crate) fn new_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}
