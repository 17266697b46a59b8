//! Integration tests for the reconciliation engine: task actions, the
//! pull-merge-write cycle, bootstrap normalization, polling and auth.

use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use workdeck::defaults::{self, BACKLOG_TABLE_ID, STATUS_DONE_ID, STATUS_NOT_STARTED_ID};
use workdeck::engine::{Engine, ViewKind};
use workdeck::error::ErrorCode;
use workdeck::notify::NullNotifier;
use workdeck::session::SessionStore;
use workdeck::store::memory::SharedRemote;
use workdeck::store::{Collections, MemoryStore, Store};
use workdeck::types::{
    AttachmentKind, DocKind, NotificationCategory, NotificationSetting, Role, TableCollection,
    TableKind, Task, TaskDraft, TaskPatch, User, ViewConfig,
};

fn user(id: &str, name: &str, login: &str) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        login: login.to_string(),
        password: "pw".to_string(),
        role: Role::Member,
        avatar: None,
        position: None,
        must_change_password: false,
    }
}

fn task(id: &str, table_id: &str, title: &str) -> Task {
    Task {
        id: id.to_string(),
        table_id: table_id.to_string(),
        title: title.to_string(),
        description: String::new(),
        status_id: STATUS_NOT_STARTED_ID.to_string(),
        priority_id: "prio-medium".to_string(),
        assignee_id: None,
        project_id: None,
        start_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2026, 1, 9).unwrap(),
        archived: false,
        comments: Vec::new(),
        attachments: Vec::new(),
        created_at: 1,
        updated_at: 1,
    }
}

fn work_table(id: &str, name: &str) -> TableCollection {
    TableCollection {
        id: id.to_string(),
        name: name.to_string(),
        kind: TableKind::Tasks,
        icon: "check-square".to_string(),
        color: None,
        view_config: Some(ViewConfig::default()),
        is_system: false,
    }
}

fn docs_table() -> TableCollection {
    TableCollection {
        id: "t-docs".to_string(),
        name: "Docs".to_string(),
        kind: TableKind::Docs,
        icon: "file-text".to_string(),
        color: None,
        view_config: None,
        is_system: true,
    }
}

/// A remote holding one user, a work table, the backlog, a docs table and
/// the default status/priority options.
fn seeded_collections() -> Collections {
    Collections {
        users: vec![user("u1", "Dana", "dana")],
        tables: vec![
            work_table("t1", "Work"),
            defaults::backlog_table(),
            docs_table(),
        ],
        statuses: defaults::default_statuses(),
        priorities: defaults::default_priorities(),
        ..Collections::default()
    }
}

/// Spin up an engine over a memory store attached to the given remote. The
/// returned tempdir holds the session marker and must outlive the engine.
async fn engine_over(remote: SharedRemote) -> (Arc<Engine>, Arc<MemoryStore>, TempDir) {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryStore::with_remote(remote));
    let engine = Arc::new(Engine::new(
        store.clone(),
        Arc::new(NullNotifier),
        SessionStore::new(dir.path().join("session.json")),
        Duration::from_millis(4000),
    ));
    engine.init().await;
    (engine, store, dir)
}

async fn signed_in_engine() -> (Arc<Engine>, Arc<MemoryStore>, TempDir) {
    let remote = Arc::new(std::sync::Mutex::new(seeded_collections()));
    let (engine, store, dir) = engine_over(remote).await;
    engine.login("dana", "pw").await.unwrap();
    (engine, store, dir)
}

mod task_actions {
    use super::*;

    #[tokio::test]
    async fn create_task_fills_engine_defaults() {
        let (engine, store, _dir) = signed_in_engine().await;
        assert_eq!(engine.state().active_table_id.as_deref(), Some("t1"));

        let id = engine
            .create_task(TaskDraft {
                title: Some("Ship it".to_string()),
                ..TaskDraft::default()
            })
            .await
            .unwrap();

        let tasks = store.tasks();
        assert_eq!(tasks.len(), 1);
        let created = &tasks[0];
        assert_eq!(created.id, id);
        assert_eq!(created.table_id, "t1");
        assert_eq!(created.status_id, STATUS_NOT_STARTED_ID);
        assert_eq!(created.priority_id, "prio-low");
        assert!(created.assignee_id.is_none());
        assert_eq!(created.start_date, created.end_date);
        // Mirror advanced with the write.
        assert_eq!(engine.state().tasks.len(), 1);
    }

    #[tokio::test]
    async fn create_task_requires_a_signed_in_user() {
        let remote = Arc::new(std::sync::Mutex::new(seeded_collections()));
        let (engine, store, _dir) = engine_over(remote).await;
        assert!(engine.create_task(TaskDraft::default()).await.is_none());
        assert!(store.tasks().is_empty());
    }

    #[tokio::test]
    async fn add_comment_appends_and_records_activity() {
        let (engine, store, _dir) = signed_in_engine().await;
        store
            .remote()
            .lock()
            .unwrap()
            .tasks
            .push(task("task-1", "t1", "Review PR"));

        engine.add_comment("task-1", "LGTM").await;

        let tasks = store.tasks();
        let comments = &tasks[0].comments;
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, "LGTM");
        assert_eq!(comments[0].user_id, "u1");
        assert_eq!(comments[0].user_name, "Dana");

        // Missing category defaults to system-enabled.
        let activities = store.activities();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].action, "commented on task");
        assert!(!activities[0].read);
    }

    #[tokio::test]
    async fn comment_activity_respects_the_system_gate() {
        let (engine, store, _dir) = signed_in_engine().await;
        store.set_notification_settings(
            [(
                NotificationCategory::NewComment,
                NotificationSetting {
                    system: false,
                    telegram: false,
                },
            )]
            .into_iter()
            .collect(),
        );
        store
            .remote()
            .lock()
            .unwrap()
            .tasks
            .push(task("task-1", "t1", "Review PR"));

        engine.add_comment("task-1", "LGTM").await;

        assert_eq!(store.tasks()[0].comments.len(), 1);
        assert!(store.activities().is_empty());
    }

    #[tokio::test]
    async fn status_change_is_audited() {
        let (engine, store, _dir) = signed_in_engine().await;
        store
            .remote()
            .lock()
            .unwrap()
            .tasks
            .push(task("task-1", "t1", "Review PR"));

        engine
            .update_task(
                "task-1",
                TaskPatch {
                    status_id: Some(STATUS_DONE_ID.to_string()),
                    ..TaskPatch::default()
                },
            )
            .await;

        let activities = store.activities();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].action, "changed status");
        assert!(activities[0].details.contains("Not started"));
        assert!(activities[0].details.contains("Done"));
    }

    #[tokio::test]
    async fn archive_hides_and_restore_brings_back() {
        let (engine, store, _dir) = signed_in_engine().await;
        store
            .remote()
            .lock()
            .unwrap()
            .tasks
            .push(task("task-1", "t1", "Review PR"));
        engine.poll_once().await;
        assert_eq!(engine.filtered_tasks().len(), 1);

        engine.archive_task("task-1").await;
        assert!(store.tasks()[0].archived);
        assert!(engine.filtered_tasks().is_empty());

        engine.restore_task("task-1").await;
        assert!(!store.tasks()[0].archived);
        assert_eq!(engine.filtered_tasks().len(), 1);
    }

    #[tokio::test]
    async fn archiving_the_open_task_closes_it() {
        let (engine, store, _dir) = signed_in_engine().await;
        store
            .remote()
            .lock()
            .unwrap()
            .tasks
            .push(task("task-1", "t1", "Review PR"));
        engine.poll_once().await;

        assert!(engine.open_task("task-1"));
        engine.archive_task("task-1").await;
        assert!(engine.state().open_task.is_none());
    }

    #[tokio::test]
    async fn permanent_delete_removes_the_task() {
        let (engine, store, _dir) = signed_in_engine().await;
        store
            .remote()
            .lock()
            .unwrap()
            .tasks
            .push(task("task-1", "t1", "Review PR"));
        engine.poll_once().await;
        engine.open_task("task-1");

        engine.delete_task_permanently("task-1").await;

        assert!(store.tasks().is_empty());
        assert!(store.remote().lock().unwrap().tasks.is_empty());
        assert!(engine.state().open_task.is_none());
    }

    #[tokio::test]
    async fn take_to_work_moves_assigns_and_advances() {
        let (engine, store, _dir) = signed_in_engine().await;
        store
            .remote()
            .lock()
            .unwrap()
            .tasks
            .push(task("task-1", BACKLOG_TABLE_ID, "Someday"));

        engine.take_to_work("task-1").await;

        let tasks = store.tasks();
        assert_eq!(tasks[0].table_id, "t1");
        assert_eq!(tasks[0].assignee_id.as_deref(), Some("u1"));
        // First status that is not "not started".
        assert_eq!(tasks[0].status_id, "status-in-progress");
    }

    #[tokio::test]
    async fn take_to_work_without_a_second_status_leaves_status() {
        let remote = Arc::new(std::sync::Mutex::new(Collections {
            statuses: vec![defaults::default_statuses().remove(0)],
            ..seeded_collections()
        }));
        let (engine, store, _dir) = engine_over(remote).await;
        engine.login("dana", "pw").await.unwrap();
        store
            .remote()
            .lock()
            .unwrap()
            .tasks
            .push(task("task-1", BACKLOG_TABLE_ID, "Someday"));

        engine.take_to_work("task-1").await;

        let tasks = store.tasks();
        assert_eq!(tasks[0].table_id, "t1");
        assert_eq!(tasks[0].status_id, STATUS_NOT_STARTED_ID);
    }

    #[tokio::test]
    async fn take_to_work_without_a_tasks_table_leaves_the_task_alone() {
        let mut collections = seeded_collections();
        collections.tables.retain(|t| t.kind != TableKind::Tasks);
        let remote = Arc::new(std::sync::Mutex::new(collections));
        let (engine, store, _dir) = engine_over(remote).await;
        engine.login("dana", "pw").await.unwrap();
        store
            .remote()
            .lock()
            .unwrap()
            .tasks
            .push(task("task-1", BACKLOG_TABLE_ID, "Someday"));

        engine.take_to_work("task-1").await;

        let tasks = store.tasks();
        assert_eq!(tasks[0].table_id, BACKLOG_TABLE_ID);
        assert!(tasks[0].assignee_id.is_none());
        assert_eq!(tasks[0].status_id, STATUS_NOT_STARTED_ID);
    }

    #[tokio::test]
    async fn comment_feed_entry_truncates_long_text() {
        let (engine, store, _dir) = signed_in_engine().await;
        store
            .remote()
            .lock()
            .unwrap()
            .tasks
            .push(task("task-1", "t1", "Review PR"));

        engine
            .add_comment("task-1", "This comment is much longer than twenty characters")
            .await;

        let activities = store.activities();
        assert_eq!(activities[0].details, "Review PR: This comment is much");
        // The comment itself is stored untruncated.
        assert_eq!(
            store.tasks()[0].comments[0].text,
            "This comment is much longer than twenty characters"
        );
    }

    #[tokio::test]
    async fn link_attachment_materializes_a_doc() {
        let (engine, store, _dir) = signed_in_engine().await;
        store
            .remote()
            .lock()
            .unwrap()
            .tasks
            .push(task("task-1", "t1", "Review PR"));

        engine
            .add_attachment(
                "task-1",
                "Design notes",
                AttachmentKind::Link,
                Some("https://example.com/notes".to_string()),
            )
            .await;

        let tasks = store.tasks();
        assert_eq!(tasks[0].attachments.len(), 1);
        assert_eq!(tasks[0].attachments[0].kind, AttachmentKind::Link);

        let docs = store.docs();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title, "Design notes");
        assert_eq!(docs[0].kind, DocKind::Link);
        assert_eq!(docs[0].table_id, "t-docs");
        assert_eq!(docs[0].url.as_deref(), Some("https://example.com/notes"));
    }

    #[tokio::test]
    async fn file_attachment_does_not_create_a_doc() {
        let (engine, store, _dir) = signed_in_engine().await;
        store
            .remote()
            .lock()
            .unwrap()
            .tasks
            .push(task("task-1", "t1", "Review PR"));

        engine
            .add_attachment("task-1", "report.pdf", AttachmentKind::File, None)
            .await;

        assert_eq!(store.tasks()[0].attachments.len(), 1);
        assert!(store.docs().is_empty());
    }
}

mod reconciliation {
    use super::*;

    #[tokio::test]
    async fn action_preserves_a_concurrent_remote_writer() {
        let (engine, store, _dir) = signed_in_engine().await;
        let id = engine
            .create_task(TaskDraft {
                title: Some("Mine".to_string()),
                ..TaskDraft::default()
            })
            .await
            .unwrap();

        // Another client appends a task directly on the remote.
        store
            .remote()
            .lock()
            .unwrap()
            .tasks
            .push(task("task-theirs", "t1", "Theirs"));

        engine
            .update_task(
                &id,
                TaskPatch {
                    title: Some("Mine, renamed".to_string()),
                    ..TaskPatch::default()
                },
            )
            .await;

        // The re-pull before the write merged their task in.
        let remote_tasks = store.remote().lock().unwrap().tasks.clone();
        assert_eq!(remote_tasks.len(), 2);
        assert!(remote_tasks.iter().any(|t| t.id == "task-theirs"));
        assert!(remote_tasks
            .iter()
            .any(|t| t.id == id && t.title == "Mine, renamed"));
    }

    #[tokio::test]
    async fn failed_pull_falls_back_to_the_cache() {
        let (engine, store, _dir) = signed_in_engine().await;
        store
            .remote()
            .lock()
            .unwrap()
            .tasks
            .push(task("task-1", "t1", "Review PR"));
        engine.poll_once().await;

        store.set_fail_loads(true);
        engine.add_comment("task-1", "still works").await;

        assert_eq!(store.tasks()[0].comments.len(), 1);
    }

    #[tokio::test]
    async fn poll_overwrites_collections_and_patches_open_task() {
        let (engine, store, _dir) = signed_in_engine().await;
        store
            .remote()
            .lock()
            .unwrap()
            .tasks
            .push(task("task-1", "t1", "Review PR"));
        engine.poll_once().await;
        assert!(engine.open_task("task-1"));

        {
            let remote = store.remote();
            let mut remote = remote.lock().unwrap();
            let t = remote.tasks.iter_mut().find(|t| t.id == "task-1").unwrap();
            t.status_id = STATUS_DONE_ID.to_string();
            t.title = "Renamed elsewhere".to_string();
            t.comments.push(workdeck::types::Comment {
                id: "c1".to_string(),
                user_id: "u2".to_string(),
                user_name: "Remote".to_string(),
                user_avatar: None,
                text: "from afar".to_string(),
                created_at: 2,
            });
        }

        engine.poll_once().await;

        let state = engine.state();
        let open = state.open_task.as_ref().unwrap();
        // Comments, attachments and status track the remote.
        assert_eq!(open.comments.len(), 1);
        assert_eq!(open.status_id, STATUS_DONE_ID);
        // Other fields of the open view are left alone.
        assert_eq!(open.title, "Review PR");
        // The collection mirror takes the remote wholesale.
        assert_eq!(state.tasks[0].title, "Renamed elsewhere");
    }

    #[tokio::test]
    async fn failed_poll_keeps_in_memory_state() {
        let (engine, store, _dir) = signed_in_engine().await;
        store
            .remote()
            .lock()
            .unwrap()
            .tasks
            .push(task("task-1", "t1", "Review PR"));
        engine.poll_once().await;
        assert_eq!(engine.state().tasks.len(), 1);

        store.set_fail_loads(true);
        store.remote().lock().unwrap().tasks.clear();
        engine.poll_once().await;

        assert_eq!(engine.state().tasks.len(), 1);
    }
}

mod bootstrap {
    use super::*;

    #[tokio::test]
    async fn duplicate_table_ids_keep_the_first_occurrence() {
        let mut collections = seeded_collections();
        collections.tables.push(work_table("t1", "Impostor"));
        let remote = Arc::new(std::sync::Mutex::new(collections));
        let (engine, _store, _dir) = engine_over(remote).await;

        let state = engine.state();
        let t1s: Vec<_> = state.tables.iter().filter(|t| t.id == "t1").collect();
        assert_eq!(t1s.len(), 1);
        assert_eq!(t1s[0].name, "Work");
    }

    #[tokio::test]
    async fn backlog_collapses_to_one_preferring_system() {
        let mut collections = seeded_collections();
        collections.tables.insert(
            0,
            TableCollection {
                id: "t-user-backlog".to_string(),
                name: "Backlog".to_string(),
                kind: TableKind::Backlog,
                icon: "inbox".to_string(),
                color: None,
                view_config: None,
                is_system: false,
            },
        );
        collections.tables.push(TableCollection {
            id: "t-another-backlog".to_string(),
            name: "backlog".to_string(),
            kind: TableKind::Backlog,
            icon: "inbox".to_string(),
            color: None,
            view_config: None,
            is_system: false,
        });
        let remote = Arc::new(std::sync::Mutex::new(collections));
        let (engine, store, _dir) = engine_over(remote).await;

        let state = engine.state();
        let backlogs: Vec<_> = state
            .tables
            .iter()
            .filter(|t| t.kind == TableKind::Backlog)
            .collect();
        assert_eq!(backlogs.len(), 1);
        assert_eq!(backlogs[0].id, BACKLOG_TABLE_ID);
        assert!(backlogs[0].is_system);

        // Normalization is presentation-only; the remote keeps all three.
        let remote_backlogs = store
            .remote()
            .lock()
            .unwrap()
            .tables
            .iter()
            .filter(|t| t.kind == TableKind::Backlog)
            .count();
        assert_eq!(remote_backlogs, 3);
    }

    #[tokio::test]
    async fn tasks_table_named_backlog_keeps_its_identity() {
        let mut collections = seeded_collections();
        collections.tables.push(work_table("t2", "Backlog"));
        let remote = Arc::new(std::sync::Mutex::new(collections));
        let (engine, _store, _dir) = engine_over(remote).await;

        // Only kind participates in the collapse, never the name.
        let state = engine.state();
        let named = state.tables.iter().find(|t| t.id == "t2").unwrap();
        assert_eq!(named.kind, TableKind::Tasks);
        assert!(state.tables.iter().any(|t| t.id == BACKLOG_TABLE_ID));
    }

    #[tokio::test]
    async fn missing_backlog_is_synthesized() {
        let mut collections = seeded_collections();
        collections.tables.retain(|t| t.kind != TableKind::Backlog);
        let remote = Arc::new(std::sync::Mutex::new(collections));
        let (engine, _store, _dir) = engine_over(remote).await;

        let state = engine.state();
        assert!(state.tables.iter().any(|t| t.id == BACKLOG_TABLE_ID));
    }

    #[tokio::test]
    async fn empty_options_fall_back_to_defaults() {
        let remote = Arc::new(std::sync::Mutex::new(Collections {
            statuses: Vec::new(),
            priorities: Vec::new(),
            ..seeded_collections()
        }));
        let (engine, _store, _dir) = engine_over(remote).await;

        let state = engine.state();
        assert_eq!(state.statuses.len(), defaults::default_statuses().len());
        assert_eq!(state.priorities.len(), defaults::default_priorities().len());
    }

    #[tokio::test]
    async fn first_tasks_table_is_auto_selected() {
        let remote = Arc::new(std::sync::Mutex::new(seeded_collections()));
        let (engine, _store, _dir) = engine_over(remote).await;

        let state = engine.state();
        assert_eq!(state.active_table_id.as_deref(), Some("t1"));
        assert_eq!(state.current_view, ViewKind::Table);
        // Tasks tables start with done tasks hidden.
        assert!(state.filter.hide_done);
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn editing_a_table_updates_all_descriptive_fields() {
        let (engine, store, _dir) = signed_in_engine().await;

        engine
            .update_table(
                "t1",
                "Reference",
                TableKind::Docs,
                "book",
                Some("#7c3aed".to_string()),
            )
            .await;

        let tables = store.tables();
        let edited = tables.iter().find(|t| t.id == "t1").unwrap();
        assert_eq!(edited.name, "Reference");
        assert_eq!(edited.kind, TableKind::Docs);
        assert_eq!(edited.icon, "book");
        assert_eq!(edited.color.as_deref(), Some("#7c3aed"));
    }

    #[tokio::test]
    async fn selecting_a_non_tasks_table_shows_done() {
        let remote = Arc::new(std::sync::Mutex::new(seeded_collections()));
        let (engine, _store, _dir) = engine_over(remote).await;

        engine.select_table(BACKLOG_TABLE_ID);
        assert!(!engine.state().filter.hide_done);

        engine.select_table("t1");
        assert!(engine.state().filter.hide_done);
    }
}

mod auth {
    use super::*;

    fn admin() -> User {
        User {
            must_change_password: true,
            ..user("u-admin", "Admin", "admin")
        }
    }

    #[tokio::test]
    async fn unknown_login_is_rejected() {
        let remote = Arc::new(std::sync::Mutex::new(seeded_collections()));
        let (engine, _store, _dir) = engine_over(remote).await;

        let err = engine.login("nobody", "pw").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCredentials);
        let state = engine.state();
        assert!(state.current_user.is_none());
        assert!(state.auth_error.is_some());
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let remote = Arc::new(std::sync::Mutex::new(seeded_collections()));
        let (engine, _store, _dir) = engine_over(remote).await;

        let err = engine.login("dana", "wrong").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCredentials);
        assert!(engine.current_user().is_none());
    }

    #[tokio::test]
    async fn login_ignores_case_beyond_ascii() {
        let mut collections = seeded_collections();
        collections.users.push(user("u-lena", "Lena", "лена"));
        let remote = Arc::new(std::sync::Mutex::new(collections));
        let (engine, _store, _dir) = engine_over(remote).await;

        engine.login("ЛЕНА", "pw").await.unwrap();
        assert_eq!(engine.current_user().unwrap().id, "u-lena");
    }

    #[tokio::test]
    async fn forced_password_change_never_signs_in_directly() {
        let mut collections = seeded_collections();
        collections.users.push(admin());
        let remote = Arc::new(std::sync::Mutex::new(collections));
        let (engine, store, _dir) = engine_over(remote).await;

        engine.login("admin", "pw").await.unwrap();
        {
            let state = engine.state();
            assert!(state.current_user.is_none());
            assert!(state.change_password_mode);
            assert_eq!(state.pending_login.as_deref(), Some("admin"));
        }

        let err = engine
            .complete_password_change("new", "different")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PasswordMismatch);
        assert!(engine.current_user().is_none());

        engine.complete_password_change("new", "new").await.unwrap();
        assert_eq!(engine.current_user().unwrap().login, "admin");

        let persisted = store
            .users()
            .into_iter()
            .find(|u| u.login == "admin")
            .unwrap();
        assert_eq!(persisted.password, "new");
        assert!(!persisted.must_change_password);
    }

    #[tokio::test]
    async fn session_marker_restores_the_user() {
        let remote = Arc::new(std::sync::Mutex::new(seeded_collections()));
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("session.json");

        {
            let store = Arc::new(MemoryStore::with_remote(remote.clone()));
            let engine = Engine::new(
                store,
                Arc::new(NullNotifier),
                SessionStore::new(marker.clone()),
                Duration::from_millis(4000),
            );
            engine.init().await;
            engine.login("dana", "pw").await.unwrap();
        }

        // A fresh engine over the same marker trusts its user id.
        let store = Arc::new(MemoryStore::with_remote(remote));
        let engine = Engine::new(
            store,
            Arc::new(NullNotifier),
            SessionStore::new(marker),
            Duration::from_millis(4000),
        );
        engine.init().await;
        assert_eq!(engine.current_user().unwrap().id, "u1");
    }

    #[tokio::test]
    async fn logout_clears_user_session_and_navigation() {
        let (engine, _store, dir) = signed_in_engine().await;
        engine.navigate(ViewKind::Inbox);

        engine.logout();

        let state = engine.state();
        assert!(state.current_user.is_none());
        assert_eq!(state.current_view, ViewKind::Home);
        assert!(state.open_task.is_none());
        drop(state);

        let session = SessionStore::new(dir.path().join("session.json"));
        assert!(session.user_id().is_none());
    }
}

mod notifications {
    use super::*;
    use workdeck::notify::Notifier;

    #[derive(Default)]
    struct RecordingNotifier(std::sync::Mutex<Vec<String>>);

    #[async_trait::async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    #[tokio::test]
    async fn dispatch_requires_gate_and_a_different_assignee() {
        let mut collections = seeded_collections();
        collections.users.push(user("u2", "Robin", "robin"));
        let remote = Arc::new(std::sync::Mutex::new(collections));

        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::with_remote(remote));
        store.set_notification_settings(
            [(
                NotificationCategory::NewTask,
                NotificationSetting {
                    system: true,
                    telegram: true,
                },
            )]
            .into_iter()
            .collect(),
        );
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = Arc::new(Engine::new(
            store,
            notifier.clone(),
            SessionStore::new(dir.path().join("session.json")),
            Duration::from_millis(4000),
        ));
        engine.init().await;
        engine.login("dana", "pw").await.unwrap();

        // Assigned to somebody else: dispatched.
        engine
            .create_task(TaskDraft {
                title: Some("For Robin".to_string()),
                assignee_id: Some("u2".to_string()),
                ..TaskDraft::default()
            })
            .await
            .unwrap();
        // Left unassigned: nobody to notify.
        engine
            .create_task(TaskDraft {
                title: Some("For myself".to_string()),
                ..TaskDraft::default()
            })
            .await
            .unwrap();

        // Dispatch runs on a detached task.
        tokio::time::sleep(Duration::from_millis(50)).await;

        let sent = notifier.0.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("For Robin"));
        assert!(sent[0].contains("Robin"));
    }

    #[tokio::test]
    async fn take_to_work_announces_the_status_change() {
        let remote = Arc::new(std::sync::Mutex::new(seeded_collections()));
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::with_remote(remote));
        store.set_notification_settings(
            [(
                NotificationCategory::StatusChange,
                NotificationSetting {
                    system: true,
                    telegram: true,
                },
            )]
            .into_iter()
            .collect(),
        );
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = Arc::new(Engine::new(
            store.clone(),
            notifier.clone(),
            SessionStore::new(dir.path().join("session.json")),
            Duration::from_millis(4000),
        ));
        engine.init().await;
        engine.login("dana", "pw").await.unwrap();
        store
            .remote()
            .lock()
            .unwrap()
            .tasks
            .push(task("task-1", BACKLOG_TABLE_ID, "Someday"));

        engine.take_to_work("task-1").await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        // The move rode the regular update path, so the audit trail and the
        // external dispatch both fired.
        let activities = store.activities();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].action, "changed status");
        let sent = notifier.0.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("Someday"));
    }
}

mod activity_feed {
    use super::*;

    #[tokio::test]
    async fn read_flags_persist() {
        let (engine, store, _dir) = signed_in_engine().await;
        store
            .remote()
            .lock()
            .unwrap()
            .tasks
            .push(task("task-1", "t1", "Review PR"));
        engine.add_comment("task-1", "one").await;
        engine.add_comment("task-1", "two").await;
        assert_eq!(engine.unread_activities().len(), 2);

        let first = store.activities()[0].id.clone();
        engine.mark_activity_read(&first);
        assert_eq!(engine.unread_activities().len(), 1);

        engine.mark_all_activities_read();
        assert!(engine.unread_activities().is_empty());
        assert!(store.activities().iter().all(|a| a.read));
    }
}
