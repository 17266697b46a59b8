//! Integration tests for the sqlite-backed store: round-trips, collection
//! overwrite semantics, the activity feed and remote snapshot sync.

use chrono::NaiveDate;
use tempfile::TempDir;
use workdeck::defaults;
use workdeck::store::sqlite::default_notification_settings;
use workdeck::store::{Collections, SqliteStore, Store};
use workdeck::types::{
    ActivityLog, Attachment, AttachmentKind, Comment, NotificationCategory, NotificationSetting,
    Role, Task,
};

fn task(id: &str, title: &str) -> Task {
    Task {
        id: id.to_string(),
        table_id: "t1".to_string(),
        title: title.to_string(),
        description: "desc".to_string(),
        status_id: "status-not-started".to_string(),
        priority_id: "prio-medium".to_string(),
        assignee_id: Some("u1".to_string()),
        project_id: None,
        start_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2026, 2, 5).unwrap(),
        archived: false,
        comments: Vec::new(),
        attachments: Vec::new(),
        created_at: 10,
        updated_at: 20,
    }
}

mod round_trips {
    use super::*;

    #[test]
    fn tasks_preserve_nested_data_and_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut first = task("task-b", "Written first");
        first.comments.push(Comment {
            id: "c1".to_string(),
            user_id: "u1".to_string(),
            user_name: "Dana".to_string(),
            user_avatar: None,
            text: "note".to_string(),
            created_at: 11,
        });
        first.attachments.push(Attachment {
            id: "a1".to_string(),
            name: "notes.pdf".to_string(),
            kind: AttachmentKind::File,
            url: None,
            created_at: 12,
        });
        let second = task("task-a", "Written second");

        store.set_tasks(&[first.clone(), second]).unwrap();
        let loaded = store.tasks();

        // Insertion order, not id order.
        assert_eq!(loaded[0].id, "task-b");
        assert_eq!(loaded[1].id, "task-a");
        assert_eq!(loaded[0].comments.len(), 1);
        assert_eq!(loaded[0].comments[0].text, "note");
        assert_eq!(loaded[0].attachments[0].kind, AttachmentKind::File);
        assert_eq!(loaded[0].start_date, first.start_date);
        assert_eq!(loaded[0].updated_at, 20);
    }

    #[test]
    fn statuses_keep_configured_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set_statuses(&defaults::default_statuses()).unwrap();
        let loaded = store.statuses();
        let expected: Vec<_> = defaults::default_statuses()
            .into_iter()
            .map(|s| s.id)
            .collect();
        let actual: Vec<_> = loaded.into_iter().map(|s| s.id).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn tables_round_trip_view_config() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set_tables(&defaults::default_tables()).unwrap();
        let loaded = store.tables();
        assert_eq!(loaded.len(), defaults::default_tables().len());
        let work = loaded.iter().find(|t| t.id == "table-work").unwrap();
        assert!(work.view_config.is_some());
        assert!(work.is_system);
        let backlog = loaded
            .iter()
            .find(|t| t.id == defaults::BACKLOG_TABLE_ID)
            .unwrap();
        assert!(backlog.view_config.is_none());
    }

    #[test]
    fn users_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set_users(&[defaults::default_admin()]).unwrap();
        let loaded = store.users();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].login, "admin");
        assert_eq!(loaded[0].role, Role::Admin);
        assert!(loaded[0].must_change_password);
    }
}

mod overwrite_semantics {
    use super::*;

    #[test]
    fn set_replaces_the_whole_collection() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .set_tasks(&[task("t-1", "a"), task("t-2", "b"), task("t-3", "c")])
            .unwrap();
        assert_eq!(store.tasks().len(), 3);

        store.set_tasks(&[task("t-2", "b only")]).unwrap();
        let loaded = store.tasks();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].title, "b only");
    }

    #[test]
    fn data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.set_tasks(&[task("t-1", "persisted")]).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.tasks()[0].title, "persisted");
    }
}

mod activity_feed {
    use super::*;

    fn entry(id: &str, ts: i64) -> ActivityLog {
        ActivityLog {
            id: id.to_string(),
            user_id: "u1".to_string(),
            user_name: "Dana".to_string(),
            user_avatar: None,
            action: "created task".to_string(),
            details: "Ship it".to_string(),
            timestamp: ts,
            read: false,
        }
    }

    #[test]
    fn add_activity_appends_and_returns_the_feed() {
        let store = SqliteStore::open_in_memory().unwrap();
        let feed = store.add_activity(entry("act-1", 1)).unwrap();
        assert_eq!(feed.len(), 1);
        let feed = store.add_activity(entry("act-2", 2)).unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[1].id, "act-2");
    }
}

mod notification_settings {
    use super::*;

    #[test]
    fn unset_settings_fall_back_to_defaults() {
        let store = SqliteStore::open_in_memory().unwrap();
        let settings = store.notification_settings();
        assert_eq!(settings, default_notification_settings());
        // All recorded internally, none dispatched externally.
        let gate = settings[&NotificationCategory::NewTask];
        assert!(gate.system);
        assert!(!gate.telegram);
    }

    #[test]
    fn settings_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut settings = default_notification_settings();
        settings.insert(
            NotificationCategory::NewComment,
            NotificationSetting {
                system: false,
                telegram: true,
            },
        );
        store.set_notification_settings(&settings).unwrap();
        assert_eq!(store.notification_settings(), settings);
    }
}

mod remote_sync {
    use super::*;

    #[tokio::test]
    async fn load_pulls_the_remote_snapshot() {
        let dir = TempDir::new().unwrap();
        let remote = dir.path().join("remote.json");
        let snapshot = Collections {
            tasks: vec![task("t-remote", "From the cloud")],
            statuses: defaults::default_statuses(),
            ..Collections::default()
        };
        std::fs::write(&remote, serde_json::to_vec(&snapshot).unwrap()).unwrap();

        let store = SqliteStore::open(dir.path().join("cache.db"))
            .unwrap()
            .with_remote(remote);
        assert!(store.tasks().is_empty());
        assert!(store.load().await);
        assert_eq!(store.tasks()[0].id, "t-remote");
        assert_eq!(store.statuses().len(), 4);
    }

    #[tokio::test]
    async fn missing_remote_fails_load_and_keeps_cache() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(dir.path().join("cache.db"))
            .unwrap()
            .with_remote(dir.path().join("nope.json"));
        store.set_tasks(&[task("t-1", "cached")]).unwrap();

        assert!(!store.load().await);
        assert_eq!(store.tasks()[0].title, "cached");
    }

    #[tokio::test]
    async fn local_only_load_is_a_successful_noop() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set_tasks(&[task("t-1", "local")]).unwrap();
        assert!(store.load().await);
        assert_eq!(store.tasks().len(), 1);
    }

    #[tokio::test]
    async fn writes_push_to_the_remote_snapshot() {
        let dir = TempDir::new().unwrap();
        let remote = dir.path().join("remote.json");
        let store = SqliteStore::open(dir.path().join("cache.db"))
            .unwrap()
            .with_remote(remote.clone());

        store.set_tasks(&[task("t-1", "pushed")]).unwrap();

        let bytes = std::fs::read(&remote).unwrap();
        let snapshot: Collections = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(snapshot.tasks.len(), 1);
        assert_eq!(snapshot.tasks[0].title, "pushed");
    }
}
