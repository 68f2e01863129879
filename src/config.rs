//! Agent configuration.
//!
//! Loaded from a JSON file under the user config directory; a missing or
//! corrupt file yields the defaults. All timing knobs are stored as integer
//! milliseconds.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_permission_poll_ms() -> u64 {
    1000
}

fn default_geometry_debounce_ms() -> u64 {
    500
}

fn default_settle_delay_ms() -> u64 {
    200
}

fn default_hide_delay_ms() -> u64 {
    200
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Cadence of the accessibility-trust poll.
    #[serde(default = "default_permission_poll_ms")]
    pub permission_poll_ms: u64,
    /// Quiet period after a workspace notification before the dock is
    /// resampled, letting it settle visually first.
    #[serde(default = "default_geometry_debounce_ms")]
    pub geometry_debounce_ms: u64,
    /// Pause between a suppressed click and the window toggle, letting any
    /// default activation the OS already started finish.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Pause between the window toggle and hiding the whole app.
    #[serde(default = "default_hide_delay_ms")]
    pub hide_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            permission_poll_ms: default_permission_poll_ms(),
            geometry_debounce_ms: default_geometry_debounce_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            hide_delay_ms: default_hide_delay_ms(),
        }
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("docktoggle").join("config.json"))
}

impl Config {
    pub fn load() -> Self {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;
        std::fs::write(path, json).map_err(|e| e.to_string())
    }

    pub fn permission_poll_interval(&self) -> Duration {
        Duration::from_millis(self.permission_poll_ms)
    }

    pub fn geometry_debounce(&self) -> Duration {
        Duration::from_millis(self.geometry_debounce_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn hide_delay(&self) -> Duration {
        Duration::from_millis(self.hide_delay_ms)
    }
}
