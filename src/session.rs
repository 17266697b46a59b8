//! Durable session marker.
//!
//! A small JSON file holding the signed-in user's id and the theme
//! preference. Presence of a user id restores the session on startup without
//! re-authentication -- a trust-on-presence model with no expiry, preserved
//! deliberately.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const THEME_DARK: &str = "dark";
pub const THEME_LIGHT: &str = "light";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Marker {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    theme: Option<String>,
}

/// File-backed session marker store. All writes are best-effort: a marker
/// that fails to persist degrades to "not signed in next launch", never to an
/// error surfaced through the engine.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Default marker location under the platform data directory.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("workdeck")
            .join("session.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Marker {
        std::fs::read(&self.path)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .unwrap_or_default()
    }

    fn write(&self, marker: &Marker) {
        let result = (|| -> anyhow::Result<()> {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&self.path, serde_json::to_vec_pretty(marker)?)?;
            Ok(())
        })();
        if let Err(e) = result {
            warn!(error = %e, path = %self.path.display(), "Failed to persist session marker");
        }
    }

    pub fn user_id(&self) -> Option<String> {
        self.read().user_id
    }

    pub fn set_user_id(&self, user_id: &str) {
        let mut marker = self.read();
        marker.user_id = Some(user_id.to_string());
        self.write(&marker);
    }

    pub fn clear_user(&self) {
        let mut marker = self.read();
        marker.user_id = None;
        self.write(&marker);
    }

    /// Stored theme literal; anything other than "dark" means light.
    pub fn dark_mode(&self) -> bool {
        self.read().theme.as_deref() == Some(THEME_DARK)
    }

    pub fn set_dark_mode(&self, dark: bool) {
        let mut marker = self.read();
        marker.theme = Some(if dark { THEME_DARK } else { THEME_LIGHT }.to_string());
        self.write(&marker);
    }
}
