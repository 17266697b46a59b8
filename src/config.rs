//! Configuration loading.
//!
//! YAML config with serde defaults, discovered in order:
//! 1. `WORKDECK_CONFIG_PATH` environment variable
//! 2. `./workdeck.yaml`
//! 3. `~/.config/workdeck/config.yaml`
//!
//! Individual paths can additionally be overridden through
//! `WORKDECK_DB_PATH` and `WORKDECK_REMOTE_PATH`, and through CLI flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Reference poll cadence of the background sync.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 4000;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Local sqlite cache path.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// Optional remote snapshot file acting as the cloud side.
    #[serde(default)]
    pub remote_path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            remote_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Background poll interval in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session marker file path.
    #[serde(default = "default_session_path")]
    pub marker_path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            marker_path: default_session_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("workdeck.db")
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_session_path() -> PathBuf {
    crate::session::SessionStore::default_path()
}

impl Config {
    /// Load configuration from the discovered path, then apply environment
    /// overrides. Missing config files yield the defaults.
    pub fn load() -> Result<Self> {
        let mut config = match Self::discover_path() {
            Some(path) => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_yaml::from_str(&text)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    fn discover_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("WORKDECK_CONFIG_PATH") {
            return Some(PathBuf::from(path));
        }
        let local = PathBuf::from("workdeck.yaml");
        if local.exists() {
            return Some(local);
        }
        let user = dirs::config_dir()?.join("workdeck").join("config.yaml");
        if user.exists() {
            return Some(user);
        }
        None
    }

    fn apply_env(&mut self) {
        if let Ok(path) = std::env::var("WORKDECK_DB_PATH") {
            self.storage.db_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("WORKDECK_REMOTE_PATH") {
            self.storage.remote_path = Some(PathBuf::from(path));
        }
    }
}
