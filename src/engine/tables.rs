//! Table collection management: bootstrap deduplication, selection with view
//! correction, and table CRUD.

use super::{new_id, Engine, ViewKind};
use crate::defaults::{self, BACKLOG_TABLE_ID};
use crate::types::{TableCollection, TableKind, ViewConfig, ViewMode};
use std::collections::HashSet;
use tracing::{debug, info};

/// Normalize a loaded table list for presentation.
///
/// Duplicate ids keep their first occurrence. Backlog tables are collapsed to
/// a single entry, preferring a system-flagged one over user copies; when no
/// backlog table exists at all, the built-in one is synthesized. Normalization
/// is in-memory only and is never written back, so a remote holding
/// duplicates keeps them until some other write replaces the collection.
pub(super) fn bootstrap_tables(loaded: Vec<TableCollection>) -> Vec<TableCollection> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut tables: Vec<TableCollection> = Vec::with_capacity(loaded.len());
    for table in loaded {
        if seen.insert(table.id.clone()) {
            tables.push(table);
        } else {
            debug!(table_id = %table.id, "Dropping duplicate table during bootstrap");
        }
    }

    match tables.iter().position(is_backlog) {
        None => {
            info!("No backlog table found; synthesizing the built-in one");
            tables.insert(0, defaults::backlog_table());
        }
        Some(first) => {
            // Keep exactly one backlog entry, preferring a system one.
            let keep = tables
                .iter()
                .position(|t| is_backlog(t) && t.is_system)
                .unwrap_or(first);
            let kept = tables[keep].clone();
            tables.retain(|t| !is_backlog(t));
            tables.insert(first.min(tables.len()), kept);
        }
    }
    tables
}

// Only backlog-typed tables take part in the collapse; a user table that
// merely shares the name keeps its own identity.
fn is_backlog(table: &TableCollection) -> bool {
    table.id == BACKLOG_TABLE_ID || table.kind == TableKind::Backlog
}

impl Engine {
    /// Make a table active and correct the dependent view state: done tasks
    /// are hidden on task tables and shown everywhere else, and a view mode
    /// the table does not enable falls back to its first enabled one.
    pub fn select_table(&self, table_id: &str) {
        let mut state = self.state();
        let Some(table) = state.tables.iter().find(|t| t.id == table_id).cloned() else {
            return;
        };
        state.active_table_id = Some(table.id.clone());
        state.current_view = ViewKind::Table;
        state.filter.hide_done = table.kind == TableKind::Tasks;
        let config = table.view_config.unwrap_or_default();
        if !state.view_mode.enabled_in(&config) {
            state.view_mode = ViewMode::first_enabled(&config).unwrap_or_default();
        }
        drop(state);
        self.poke();
    }

    /// Select the first tasks table when no table is active yet; falls back
    /// to the first table of any kind.
    pub(super) fn auto_select_table(&self) {
        let pick = {
            let state = self.state();
            if state.active_table_id.is_some() {
                None
            } else {
                state
                    .tables
                    .iter()
                    .find(|t| t.kind == TableKind::Tasks)
                    .or_else(|| state.tables.first())
                    .map(|t| t.id.clone())
            }
        };
        if let Some(id) = pick {
            self.select_table(&id);
        }
    }

    /// Create a table and make it active.
    pub async fn create_table(&self, name: &str, kind: TableKind, icon: &str) -> String {
        self.refresh().await;
        let table = TableCollection {
            id: new_id("table"),
            name: name.to_string(),
            kind,
            icon: icon.to_string(),
            color: None,
            view_config: (kind == TableKind::Tasks).then(ViewConfig::default),
            is_system: false,
        };
        let id = table.id.clone();
        let mut tables = self.store().tables();
        tables.push(table);
        self.persist_tables(tables);
        self.select_table(&id);
        id
    }

    /// Edit a table's descriptive fields in one step, the way the edit dialog
    /// submits them.
    pub async fn update_table(
        &self,
        table_id: &str,
        name: &str,
        kind: TableKind,
        icon: &str,
        color: Option<String>,
    ) {
        self.refresh().await;
        let mut tables = self.store().tables();
        if let Some(table) = tables.iter_mut().find(|t| t.id == table_id) {
            table.name = name.to_string();
            table.kind = kind;
            table.icon = icon.to_string();
            table.color = color;
        }
        self.persist_tables(tables);
    }

    /// Change which sub-views a table enables. The active view mode is
    /// corrected immediately if it was just disabled.
    pub async fn update_table_views(&self, table_id: &str, view_config: ViewConfig) {
        self.refresh().await;
        let mut tables = self.store().tables();
        if let Some(table) = tables.iter_mut().find(|t| t.id == table_id) {
            table.view_config = Some(view_config);
        }
        self.persist_tables(tables);

        let mut state = self.state();
        if state.active_table_id.as_deref() == Some(table_id)
            && !state.view_mode.enabled_in(&view_config)
        {
            state.view_mode = ViewMode::first_enabled(&view_config).unwrap_or_default();
        }
    }

    /// Delete a table. System tables are protected; tasks on the table keep
    /// their table reference and simply stop being visible anywhere.
    pub async fn delete_table(&self, table_id: &str) {
        self.refresh().await;
        let mut tables = self.store().tables();
        let Some(pos) = tables.iter().position(|t| t.id == table_id) else {
            return;
        };
        if tables[pos].is_system {
            debug!(table_id, "Refusing to delete a system table");
            return;
        }
        tables.remove(pos);
        self.persist_tables(tables);

        let mut state = self.state();
        if state.active_table_id.as_deref() == Some(table_id) {
            state.active_table_id = None;
            state.current_view = ViewKind::Home;
        }
        drop(state);
        self.auto_select_table();
    }
}
