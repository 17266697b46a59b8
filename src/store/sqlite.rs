//! Sqlite-backed store.
//!
//! The sqlite database is the adapter's local cache. An optional remote
//! snapshot path (typically a file on a synced share) acts as the cloud side:
//! `load()` replaces the cache from the snapshot, and every write re-exports
//! the cache to it best-effort. Without a remote path the store runs
//! local-only and `load()` is a successful no-op.

use super::{Collections, Store};
use crate::types::{
    ActivityLog, Attachment, Comment, Doc, DocKind, Folder, Meeting, NotificationCategory,
    NotificationSetting, NotificationSettings, PriorityOption, Project, Role, StatusOption,
    TableCollection, TableKind, Task, User, ViewConfig,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::warn;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

const SETTINGS_KEY_NOTIFICATIONS: &str = "notifications";

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    remote: Option<PathBuf>,
}

impl SqliteStore {
    /// Open or create the cache database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            remote: None,
        };
        store.run_migrations()?;
        Ok(store)
    }

    /// Open an in-memory cache (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            remote: None,
        };
        store.run_migrations()?;
        Ok(store)
    }

    /// Attach a remote snapshot path for cloud sync.
    pub fn with_remote<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.remote = Some(path.into());
        self
    }

    fn run_migrations(&self) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        embedded::migrations::runner().run(&mut *conn)?;
        Ok(())
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().unwrap();
        f(&conn)
    }

    fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock().unwrap();
        f(&mut conn)
    }

    /// Persist the notification settings served by this store.
    pub fn set_notification_settings(&self, settings: &NotificationSettings) -> Result<()> {
        let json = serde_json::to_string(settings)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO settings (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![SETTINGS_KEY_NOTIFICATIONS, json],
            )?;
            Ok(())
        })
    }

    /// Re-export the whole cache to the remote snapshot, if configured.
    /// Failures are logged and swallowed: the local write already succeeded.
    fn push_remote(&self) {
        let Some(ref path) = self.remote else {
            return;
        };
        let result = (|| -> Result<()> {
            let collections = self.collections();
            let json = serde_json::to_vec_pretty(&collections)?;
            std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            Ok(())
        })();
        if let Err(e) = result {
            warn!(error = %e, "Failed to push snapshot to remote");
        }
    }

    fn replace_from(&self, collections: &Collections) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            replace_users(&tx, &collections.users)?;
            replace_tasks(&tx, &collections.tasks)?;
            replace_projects(&tx, &collections.projects)?;
            replace_tables(&tx, &collections.tables)?;
            replace_docs(&tx, &collections.docs)?;
            replace_folders(&tx, &collections.folders)?;
            replace_meetings(&tx, &collections.meetings)?;
            replace_activities(&tx, &collections.activities)?;
            replace_statuses(&tx, &collections.statuses)?;
            replace_priorities(&tx, &collections.priorities)?;
            tx.commit()?;
            Ok(())
        })
    }
}

// ---------------------------------------------------------------------------
// Row parsers

fn parse_date(s: &str) -> rusqlite::Result<NaiveDate> {
    s.parse().map_err(|e: chrono::ParseError| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_user_row(row: &Row) -> rusqlite::Result<User> {
    let role: String = row.get("role")?;
    Ok(User {
        id: row.get("id")?,
        name: row.get("name")?,
        login: row.get("login")?,
        password: row.get("password")?,
        role: Role::from_str(&role).unwrap_or_default(),
        avatar: row.get("avatar")?,
        position: row.get("position_title")?,
        must_change_password: row.get("must_change_password")?,
    })
}

fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let start_date: String = row.get("start_date")?;
    let end_date: String = row.get("end_date")?;
    let comments_json: String = row.get("comments")?;
    let attachments_json: String = row.get("attachments")?;
    let comments: Vec<Comment> = serde_json::from_str(&comments_json).unwrap_or_default();
    let attachments: Vec<Attachment> = serde_json::from_str(&attachments_json).unwrap_or_default();

    Ok(Task {
        id: row.get("id")?,
        table_id: row.get("table_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status_id: row.get("status_id")?,
        priority_id: row.get("priority_id")?,
        assignee_id: row.get("assignee_id")?,
        project_id: row.get("project_id")?,
        start_date: parse_date(&start_date)?,
        end_date: parse_date(&end_date)?,
        archived: row.get("archived")?,
        comments,
        attachments,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_table_row(row: &Row) -> rusqlite::Result<TableCollection> {
    let kind: String = row.get("kind")?;
    let view_config_json: Option<String> = row.get("view_config")?;
    Ok(TableCollection {
        id: row.get("id")?,
        name: row.get("name")?,
        kind: TableKind::from_str(&kind).unwrap_or(TableKind::Tasks),
        icon: row.get("icon")?,
        color: row.get("color")?,
        view_config: view_config_json.and_then(|s| serde_json::from_str::<ViewConfig>(&s).ok()),
        is_system: row.get("is_system")?,
    })
}

fn parse_doc_row(row: &Row) -> rusqlite::Result<Doc> {
    let kind: String = row.get("kind")?;
    let tags_json: String = row.get("tags")?;
    Ok(Doc {
        id: row.get("id")?,
        table_id: row.get("table_id")?,
        folder_id: row.get("folder_id")?,
        title: row.get("title")?,
        kind: DocKind::from_str(&kind).unwrap_or(DocKind::Internal),
        url: row.get("url")?,
        content: row.get("content")?,
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
    })
}

fn parse_meeting_row(row: &Row) -> rusqlite::Result<Meeting> {
    let participants_json: String = row.get("participant_ids")?;
    Ok(Meeting {
        id: row.get("id")?,
        table_id: row.get("table_id")?,
        title: row.get("title")?,
        starts_at: row.get("starts_at")?,
        participant_ids: serde_json::from_str(&participants_json).unwrap_or_default(),
        summary: row.get("summary")?,
    })
}

fn parse_activity_row(row: &Row) -> rusqlite::Result<ActivityLog> {
    Ok(ActivityLog {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        user_name: row.get("user_name")?,
        user_avatar: row.get("user_avatar")?,
        action: row.get("action")?,
        details: row.get("details")?,
        timestamp: row.get("timestamp")?,
        read: row.get("read")?,
    })
}

// ---------------------------------------------------------------------------
// Whole-collection replace helpers (delete and insert inside the caller's
// transaction, preserving insertion order via the position column)

fn replace_users(conn: &Connection, users: &[User]) -> Result<()> {
    conn.execute("DELETE FROM users", [])?;
    for (pos, u) in users.iter().enumerate() {
        conn.execute(
            "INSERT INTO users (id, name, login, password, role, avatar, position_title,
                                must_change_password, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                u.id,
                u.name,
                u.login,
                u.password,
                u.role.as_str(),
                u.avatar,
                u.position,
                u.must_change_password,
                pos as i64,
            ],
        )?;
    }
    Ok(())
}

fn replace_tasks(conn: &Connection, tasks: &[Task]) -> Result<()> {
    conn.execute("DELETE FROM tasks", [])?;
    for (pos, t) in tasks.iter().enumerate() {
        conn.execute(
            "INSERT INTO tasks (id, table_id, title, description, status_id, priority_id,
                                assignee_id, project_id, start_date, end_date, archived,
                                comments, attachments, created_at, updated_at, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                t.id,
                t.table_id,
                t.title,
                t.description,
                t.status_id,
                t.priority_id,
                t.assignee_id,
                t.project_id,
                t.start_date.to_string(),
                t.end_date.to_string(),
                t.archived,
                serde_json::to_string(&t.comments)?,
                serde_json::to_string(&t.attachments)?,
                t.created_at,
                t.updated_at,
                pos as i64,
            ],
        )?;
    }
    Ok(())
}

fn replace_projects(conn: &Connection, projects: &[Project]) -> Result<()> {
    conn.execute("DELETE FROM projects", [])?;
    for (pos, p) in projects.iter().enumerate() {
        conn.execute(
            "INSERT INTO projects (id, name, color, position) VALUES (?1, ?2, ?3, ?4)",
            params![p.id, p.name, p.color, pos as i64],
        )?;
    }
    Ok(())
}

fn replace_tables(conn: &Connection, tables: &[TableCollection]) -> Result<()> {
    conn.execute("DELETE FROM tables", [])?;
    for (pos, t) in tables.iter().enumerate() {
        let view_config = t
            .view_config
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        conn.execute(
            "INSERT INTO tables (id, name, kind, icon, color, view_config, is_system, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                t.id,
                t.name,
                t.kind.as_str(),
                t.icon,
                t.color,
                view_config,
                t.is_system,
                pos as i64,
            ],
        )?;
    }
    Ok(())
}

fn replace_docs(conn: &Connection, docs: &[Doc]) -> Result<()> {
    conn.execute("DELETE FROM docs", [])?;
    for (pos, d) in docs.iter().enumerate() {
        conn.execute(
            "INSERT INTO docs (id, table_id, folder_id, title, kind, url, content, tags, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                d.id,
                d.table_id,
                d.folder_id,
                d.title,
                d.kind.as_str(),
                d.url,
                d.content,
                serde_json::to_string(&d.tags)?,
                pos as i64,
            ],
        )?;
    }
    Ok(())
}

fn replace_folders(conn: &Connection, folders: &[Folder]) -> Result<()> {
    conn.execute("DELETE FROM folders", [])?;
    for (pos, f) in folders.iter().enumerate() {
        conn.execute(
            "INSERT INTO folders (id, name, table_id, position) VALUES (?1, ?2, ?3, ?4)",
            params![f.id, f.name, f.table_id, pos as i64],
        )?;
    }
    Ok(())
}

fn replace_meetings(conn: &Connection, meetings: &[Meeting]) -> Result<()> {
    conn.execute("DELETE FROM meetings", [])?;
    for (pos, m) in meetings.iter().enumerate() {
        conn.execute(
            "INSERT INTO meetings (id, table_id, title, starts_at, participant_ids, summary, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                m.id,
                m.table_id,
                m.title,
                m.starts_at,
                serde_json::to_string(&m.participant_ids)?,
                m.summary,
                pos as i64,
            ],
        )?;
    }
    Ok(())
}

fn replace_activities(conn: &Connection, activities: &[ActivityLog]) -> Result<()> {
    conn.execute("DELETE FROM activities", [])?;
    for (pos, a) in activities.iter().enumerate() {
        insert_activity(conn, a, pos as i64)?;
    }
    Ok(())
}

fn insert_activity(conn: &Connection, a: &ActivityLog, pos: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO activities (id, user_id, user_name, user_avatar, action, details,
                                 timestamp, read, position)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            a.id,
            a.user_id,
            a.user_name,
            a.user_avatar,
            a.action,
            a.details,
            a.timestamp,
            a.read,
            pos,
        ],
    )?;
    Ok(())
}

fn replace_statuses(conn: &Connection, statuses: &[StatusOption]) -> Result<()> {
    conn.execute("DELETE FROM statuses", [])?;
    for (pos, s) in statuses.iter().enumerate() {
        conn.execute(
            "INSERT INTO statuses (id, name, color, position) VALUES (?1, ?2, ?3, ?4)",
            params![s.id, s.name, s.color, pos as i64],
        )?;
    }
    Ok(())
}

fn replace_priorities(conn: &Connection, priorities: &[PriorityOption]) -> Result<()> {
    conn.execute("DELETE FROM priorities", [])?;
    for (pos, p) in priorities.iter().enumerate() {
        conn.execute(
            "INSERT INTO priorities (id, name, color, position) VALUES (?1, ?2, ?3, ?4)",
            params![p.id, p.name, p.color, pos as i64],
        )?;
    }
    Ok(())
}

fn query_all<T>(
    conn: &Connection,
    sql: &str,
    parse: fn(&Row) -> rusqlite::Result<T>,
) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], parse)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

#[async_trait]
impl Store for SqliteStore {
    async fn load(&self) -> bool {
        let Some(ref path) = self.remote else {
            // Local-only mode: nothing to pull, the cache is authoritative.
            return true;
        };
        let result = (|| -> Result<()> {
            let bytes =
                std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            let collections: Collections = serde_json::from_slice(&bytes)?;
            self.replace_from(&collections)
        })();
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Remote pull failed; keeping local cache");
                false
            }
        }
    }

    fn users(&self) -> Vec<User> {
        self.with_conn(|c| query_all(c, "SELECT * FROM users ORDER BY position", parse_user_row))
            .unwrap_or_default()
    }

    fn set_users(&self, users: &[User]) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            replace_users(&tx, users)?;
            tx.commit()?;
            Ok(())
        })?;
        self.push_remote();
        Ok(())
    }

    fn tasks(&self) -> Vec<Task> {
        self.with_conn(|c| query_all(c, "SELECT * FROM tasks ORDER BY position", parse_task_row))
            .unwrap_or_default()
    }

    fn set_tasks(&self, tasks: &[Task]) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            replace_tasks(&tx, tasks)?;
            tx.commit()?;
            Ok(())
        })?;
        self.push_remote();
        Ok(())
    }

    fn projects(&self) -> Vec<Project> {
        self.with_conn(|c| {
            query_all(c, "SELECT * FROM projects ORDER BY position", |row| {
                Ok(Project {
                    id: row.get("id")?,
                    name: row.get("name")?,
                    color: row.get("color")?,
                })
            })
        })
        .unwrap_or_default()
    }

    fn set_projects(&self, projects: &[Project]) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            replace_projects(&tx, projects)?;
            tx.commit()?;
            Ok(())
        })?;
        self.push_remote();
        Ok(())
    }

    fn tables(&self) -> Vec<TableCollection> {
        self.with_conn(|c| query_all(c, "SELECT * FROM tables ORDER BY position", parse_table_row))
            .unwrap_or_default()
    }

    fn set_tables(&self, tables: &[TableCollection]) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            replace_tables(&tx, tables)?;
            tx.commit()?;
            Ok(())
        })?;
        self.push_remote();
        Ok(())
    }

    fn docs(&self) -> Vec<Doc> {
        self.with_conn(|c| query_all(c, "SELECT * FROM docs ORDER BY position", parse_doc_row))
            .unwrap_or_default()
    }

    fn set_docs(&self, docs: &[Doc]) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            replace_docs(&tx, docs)?;
            tx.commit()?;
            Ok(())
        })?;
        self.push_remote();
        Ok(())
    }

    fn folders(&self) -> Vec<Folder> {
        self.with_conn(|c| {
            query_all(c, "SELECT * FROM folders ORDER BY position", |row| {
                Ok(Folder {
                    id: row.get("id")?,
                    name: row.get("name")?,
                    table_id: row.get("table_id")?,
                })
            })
        })
        .unwrap_or_default()
    }

    fn set_folders(&self, folders: &[Folder]) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            replace_folders(&tx, folders)?;
            tx.commit()?;
            Ok(())
        })?;
        self.push_remote();
        Ok(())
    }

    fn meetings(&self) -> Vec<Meeting> {
        self.with_conn(|c| {
            query_all(
                c,
                "SELECT * FROM meetings ORDER BY position",
                parse_meeting_row,
            )
        })
        .unwrap_or_default()
    }

    fn set_meetings(&self, meetings: &[Meeting]) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            replace_meetings(&tx, meetings)?;
            tx.commit()?;
            Ok(())
        })?;
        self.push_remote();
        Ok(())
    }

    fn activities(&self) -> Vec<ActivityLog> {
        self.with_conn(|c| {
            query_all(
                c,
                "SELECT * FROM activities ORDER BY position",
                parse_activity_row,
            )
        })
        .unwrap_or_default()
    }

    fn set_activities(&self, activities: &[ActivityLog]) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            replace_activities(&tx, activities)?;
            tx.commit()?;
            Ok(())
        })?;
        self.push_remote();
        Ok(())
    }

    fn statuses(&self) -> Vec<StatusOption> {
        self.with_conn(|c| {
            query_all(c, "SELECT * FROM statuses ORDER BY position", |row| {
                Ok(StatusOption {
                    id: row.get("id")?,
                    name: row.get("name")?,
                    color: row.get("color")?,
                })
            })
        })
        .unwrap_or_default()
    }

    fn set_statuses(&self, statuses: &[StatusOption]) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            replace_statuses(&tx, statuses)?;
            tx.commit()?;
            Ok(())
        })?;
        self.push_remote();
        Ok(())
    }

    fn priorities(&self) -> Vec<PriorityOption> {
        self.with_conn(|c| {
            query_all(c, "SELECT * FROM priorities ORDER BY position", |row| {
                Ok(PriorityOption {
                    id: row.get("id")?,
                    name: row.get("name")?,
                    color: row.get("color")?,
                })
            })
        })
        .unwrap_or_default()
    }

    fn set_priorities(&self, priorities: &[PriorityOption]) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            replace_priorities(&tx, priorities)?;
            tx.commit()?;
            Ok(())
        })?;
        self.push_remote();
        Ok(())
    }

    fn add_activity(&self, entry: ActivityLog) -> Result<Vec<ActivityLog>> {
        self.with_conn(|conn| {
            let next: i64 = conn.query_row(
                "SELECT COALESCE(MAX(position) + 1, 0) FROM activities",
                [],
                |row| row.get(0),
            )?;
            insert_activity(conn, &entry, next)
        })?;
        self.push_remote();
        Ok(self.activities())
    }

    fn notification_settings(&self) -> NotificationSettings {
        let json: Option<String> = self
            .with_conn(|conn| {
                let result = conn.query_row(
                    "SELECT value FROM settings WHERE key = ?1",
                    params![SETTINGS_KEY_NOTIFICATIONS],
                    |row| row.get(0),
                );
                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .unwrap_or(None);

        json.and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_else(default_notification_settings)
    }
}

/// All categories recorded internally, none dispatched externally.
pub fn default_notification_settings() -> NotificationSettings {
    [
        NotificationCategory::NewTask,
        NotificationCategory::StatusChange,
        NotificationCategory::NewComment,
        NotificationCategory::NewDoc,
    ]
    .into_iter()
    .map(|c| {
        (
            c,
            NotificationSetting {
                system: true,
                telegram: false,
            },
        )
    })
    .collect()
}
