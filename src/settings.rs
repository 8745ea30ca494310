//! Persistent client settings.
//!
//! Settings are stored as JSON in the user config directory. Missing fields
//! take their defaults, so older files keep loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::context::{Host, PartyContext};
use crate::search::{SearchMode, SearchState, DEFAULT_MAX_GAP};

/// Client settings persisted to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Party URL the guest endpoints hang off, e.g. "http://localhost:5000/parties/7".
    #[serde(default)]
    pub base_url: String,
    /// Roster refresh period in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// "substring" (default) or "fuzzy".
    #[serde(default)]
    pub search_mode: SearchMode,
    /// Characters allowed between query letters in fuzzy mode.
    #[serde(default = "default_fuzzy_max_gap")]
    pub fuzzy_max_gap: usize,
    /// Signed-in host.
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub party_started: bool,
}

fn default_poll_interval_ms() -> u64 {
    5000
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_fuzzy_max_gap() -> usize {
    DEFAULT_MAX_GAP
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            search_mode: SearchMode::default(),
            fuzzy_max_gap: default_fuzzy_max_gap(),
            first_name: String::new(),
            last_name: String::new(),
            party_started: false,
        }
    }
}

impl Settings {
    /// `<config dir>/guest-list/settings.json`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("guest-list")
            .join("settings.json")
    }

    /// Load settings from a JSON file. Returns defaults if the file doesn't exist.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse settings file: {}, using defaults", e);
                Self::default()
            }),
            Err(_) => {
                tracing::info!("No settings file at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Save settings to a JSON file.
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!("Settings saved to {}", path.display());
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn context(&self) -> PartyContext {
        PartyContext::new(
            Host::new(self.first_name.clone(), self.last_name.clone()),
            self.party_started,
        )
    }

    pub fn search_state(&self) -> SearchState {
        SearchState::new(self.search_mode, self.fuzzy_max_gap)
    }
}
