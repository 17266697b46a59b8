//! Document, folder and meeting actions. Same pull-merge-write protocol as
//! task actions, over the docs, folders and meetings collections.

use super::{new_id, Engine, ViewKind};
use crate::types::{Doc, DocDraft, Folder, Meeting, NotificationCategory, TableKind};
use tracing::debug;

impl Engine {
    /// Create a doc on the given table (or the first docs table) and open it.
    /// Returns the new doc's id, or `None` when nobody is signed in or no
    /// docs table exists.
    pub async fn create_doc(&self, draft: DocDraft, table_id: Option<&str>) -> Option<String> {
        let actor = self.current_user()?;
        self.refresh().await;

        let table_id = match table_id {
            Some(id) => id.to_string(),
            None => {
                let state = self.state();
                state
                    .tables
                    .iter()
                    .find(|t| t.kind == TableKind::Docs)
                    .map(|t| t.id.clone())?
            }
        };

        let doc = Doc {
            id: new_id("doc"),
            table_id,
            folder_id: draft.folder_id,
            title: draft.title,
            kind: draft.kind,
            url: draft.url,
            content: draft.content,
            tags: draft.tags,
        };
        let id = doc.id.clone();
        let title = doc.title.clone();

        let mut docs = self.store().docs();
        docs.push(doc);
        self.persist_docs(docs);

        self.record_activity(
            NotificationCategory::NewDoc,
            &actor,
            "created doc",
            title.clone(),
            Some(format!("New doc: {}\nBy: {}", title, actor.name)),
        );

        let mut state = self.state();
        state.active_doc_id = Some(id.clone());
        state.current_view = ViewKind::DocEditor;
        Some(id)
    }

    /// Replace a doc's editable fields. Edits are silent; only creation is
    /// audited.
    pub async fn update_doc(&self, doc_id: &str, title: &str, content: &str, tags: Vec<String>) {
        self.refresh().await;
        let mut docs = self.store().docs();
        let Some(doc) = docs.iter_mut().find(|d| d.id == doc_id) else {
            debug!(doc_id, "Doc update target not found");
            return;
        };
        doc.title = title.to_string();
        doc.content = content.to_string();
        doc.tags = tags;
        self.persist_docs(docs);
    }

    pub async fn move_doc_to_folder(&self, doc_id: &str, folder_id: Option<&str>) {
        self.refresh().await;
        let mut docs = self.store().docs();
        if let Some(doc) = docs.iter_mut().find(|d| d.id == doc_id) {
            doc.folder_id = folder_id.map(str::to_string);
        }
        self.persist_docs(docs);
    }

    pub async fn delete_doc(&self, doc_id: &str) {
        self.refresh().await;
        let mut docs = self.store().docs();
        docs.retain(|d| d.id != doc_id);
        self.persist_docs(docs);

        let mut state = self.state();
        if state.active_doc_id.as_deref() == Some(doc_id) {
            state.active_doc_id = None;
            state.current_view = ViewKind::Table;
        }
    }

    pub async fn create_folder(&self, name: &str, table_id: &str) -> String {
        self.refresh().await;
        let folder = Folder {
            id: new_id("folder"),
            name: name.to_string(),
            table_id: table_id.to_string(),
        };
        let id = folder.id.clone();
        let mut folders = self.store().folders();
        folders.push(folder);
        self.persist_folders(folders);
        id
    }

    /// Delete a folder; docs filed under it fall back to the table root.
    pub async fn delete_folder(&self, folder_id: &str) {
        self.refresh().await;
        let mut folders = self.store().folders();
        folders.retain(|f| f.id != folder_id);
        self.persist_folders(folders);

        let mut docs = self.store().docs();
        let mut orphaned = false;
        for doc in docs.iter_mut() {
            if doc.folder_id.as_deref() == Some(folder_id) {
                doc.folder_id = None;
                orphaned = true;
            }
        }
        if orphaned {
            self.persist_docs(docs);
        }
    }

    pub async fn create_meeting(
        &self,
        table_id: &str,
        title: &str,
        starts_at: i64,
        participant_ids: Vec<String>,
    ) -> String {
        self.refresh().await;
        let meeting = Meeting {
            id: new_id("meeting"),
            table_id: table_id.to_string(),
            title: title.to_string(),
            starts_at,
            participant_ids,
            summary: String::new(),
        };
        let id = meeting.id.clone();
        let mut meetings = self.store().meetings();
        meetings.push(meeting);
        self.persist_meetings(meetings);
        id
    }

    pub async fn update_meeting_summary(&self, meeting_id: &str, summary: &str) {
        self.refresh().await;
        let mut meetings = self.store().meetings();
        if let Some(meeting) = meetings.iter_mut().find(|m| m.id == meeting_id) {
            meeting.summary = summary.to_string();
        }
        self.persist_meetings(meetings);
    }

    pub async fn delete_meeting(&self, meeting_id: &str) {
        self.refresh().await;
        let mut meetings = self.store().meetings();
        meetings.retain(|m| m.id != meeting_id);
        self.persist_meetings(meetings);
    }
}
