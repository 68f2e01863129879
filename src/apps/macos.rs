//! NSWorkspace-backed application directory.
//!
//! Every call reads live process state; activation and visibility must be
//! current at decision time, so nothing is memoized.

use objc2_app_kit::{NSRunningApplication, NSWorkspace};

use super::{AppDirectory, AppInfo};

pub struct WorkspaceDirectory;

impl WorkspaceDirectory {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WorkspaceDirectory {
    fn default() -> Self {
        Self::new()
    }
}

fn info_from(app: &NSRunningApplication) -> Option<AppInfo> {
    // Apps without a localized name (agents, helpers) can never match a dock
    // label, so they are dropped from the snapshot.
    let name = app.localizedName()?.to_string();
    Some(AppInfo {
        pid: app.processIdentifier(),
        name,
        is_frontmost: app.isActive(),
        is_hidden: app.isHidden(),
    })
}

impl AppDirectory for WorkspaceDirectory {
    fn snapshot(&self) -> Vec<AppInfo> {
        let workspace = NSWorkspace::sharedWorkspace();
        workspace
            .runningApplications()
            .to_vec()
            .iter()
            .filter_map(|app| info_from(app))
            .collect()
    }

    fn frontmost(&self) -> Option<AppInfo> {
        let workspace = NSWorkspace::sharedWorkspace();
        workspace.frontmostApplication().and_then(|app| info_from(&app))
    }

    fn hide(&self, pid: i32) -> bool {
        match unsafe { NSRunningApplication::runningApplicationWithProcessIdentifier(pid) } {
            Some(app) => app.hide(),
            None => false,
        }
    }
}
