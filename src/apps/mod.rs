//! Running-application lookup.
//!
//! Activation and visibility state must be read fresh at decision time, so the
//! directory hands out point-in-time snapshots and nothing here is cached.

#[cfg(target_os = "macos")]
pub mod macos;

use serde::{Deserialize, Serialize};

/// Point-in-time view of one running application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    pub pid: i32,
    pub name: String,
    pub is_frontmost: bool,
    pub is_hidden: bool,
}

impl AppInfo {
    pub fn new(pid: i32, name: impl Into<String>, is_frontmost: bool, is_hidden: bool) -> Self {
        Self {
            pid,
            name: name.into(),
            is_frontmost,
            is_hidden,
        }
    }
}

/// Live process table access. Implementations must not cache across calls.
pub trait AppDirectory: Send + Sync {
    /// Every running application with a usable display name.
    fn snapshot(&self) -> Vec<AppInfo>;

    /// The application currently receiving input focus, if any.
    fn frontmost(&self) -> Option<AppInfo>;

    /// Hide the whole application (distinct from per-window minimize).
    /// Returns false if the process is gone or refused.
    fn hide(&self, pid: i32) -> bool;
}
