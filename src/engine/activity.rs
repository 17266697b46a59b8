//! Activity recording and outbound notification dispatch.
//!
//! Every audited action funnels through [`Engine::record_activity`]: the
//! internal feed entry and the external message are gated independently per
//! category, and dispatch is fire-and-forget so a slow channel never blocks a
//! mutation.

use super::{new_id, Engine};
use crate::store::now_ms;
use crate::types::{
    system_enabled, telegram_enabled, ActivityLog, NotificationCategory, User,
};
use tracing::{debug, error};

impl Engine {
    /// Record an audited action: append to the internal activity feed when the
    /// category's system gate is open, and dispatch `message` externally when
    /// its external gate is open. Either half can be skipped independently.
    pub(crate) fn record_activity(
        &self,
        category: NotificationCategory,
        actor: &User,
        action: &str,
        details: String,
        message: Option<String>,
    ) {
        let settings = self.store().notification_settings();

        if system_enabled(&settings, category) {
            let entry = ActivityLog {
                id: new_id("activity"),
                user_id: actor.id.clone(),
                user_name: actor.name.clone(),
                user_avatar: actor.avatar.clone(),
                action: action.to_string(),
                details,
                timestamp: now_ms(),
                read: false,
            };
            match self.store().add_activity(entry) {
                Ok(activities) => self.state().activities = activities,
                Err(e) => error!(error = %e, "Failed to record activity"),
            }
        } else {
            debug!(category = category.as_str(), "Activity recording disabled");
        }

        if let Some(message) = message {
            if telegram_enabled(&settings, category) {
                let notifier = self.notifier();
                tokio::spawn(async move {
                    notifier.send(&message).await;
                });
            }
        }
    }

    /// Mark a single inbox entry as read.
    pub fn mark_activity_read(&self, activity_id: &str) {
        let mut activities = self.store().activities();
        let Some(entry) = activities.iter_mut().find(|a| a.id == activity_id) else {
            return;
        };
        entry.read = true;
        if let Err(e) = self.store().set_activities(&activities) {
            error!(error = %e, "Failed to persist activity read flag");
        }
        self.state().activities = activities;
    }

    /// Mark every inbox entry as read.
    pub fn mark_all_activities_read(&self) {
        let mut activities = self.store().activities();
        for entry in activities.iter_mut() {
            entry.read = true;
        }
        if let Err(e) = self.store().set_activities(&activities) {
            error!(error = %e, "Failed to persist activity read flags");
        }
        self.state().activities = activities;
    }

    /// Unread entries for the inbox badge.
    pub fn unread_activities(&self) -> Vec<ActivityLog> {
        self.state()
            .activities
            .iter()
            .filter(|a| !a.read)
            .cloned()
            .collect()
    }
}
