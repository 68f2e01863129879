//! Click disambiguation: decide whether a primary-button click on the screen
//! should be swallowed and turned into a window toggle, or forwarded to the OS
//! untouched.
//!
//! The decision runs inline with input dispatch, so everything here is a pure
//! function over data the caller already holds.

use crate::apps::AppInfo;
use crate::dock::{IconRegion, Point};

/// Outcome of disambiguating one click.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Forward the event to the OS unchanged.
    PassThrough,
    /// Consume the event and toggle the target application's windows.
    Suppress(AppInfo),
}

/// Map a click location to a verdict.
///
/// Only a click on the icon of an application that is already frontmost and
/// not hidden is suppressed; every other click (miss, unknown label, app not
/// frontmost, app hidden) keeps the standard activate/launch/unhide behavior.
pub fn decide(point: Point, regions: &[IconRegion], apps: &[AppInfo]) -> Verdict {
    // First containing region wins. Regions are non-overlapping in practice,
    // so no z-order tie-break.
    let Some(region) = regions.iter().find(|r| r.rect.contains(point)) else {
        return Verdict::PassThrough;
    };

    let Some(app) = resolve_label(&region.label, apps) else {
        return Verdict::PassThrough;
    };

    if app.is_frontmost && !app.is_hidden {
        Verdict::Suppress(app.clone())
    } else {
        Verdict::PassThrough
    }
}

/// Resolve a dock label to a running application.
///
/// Exact case-insensitive name match wins outright. Failing that, labels and
/// names match by case-insensitive substring containment in either direction,
/// which tolerates truncated or decorated dock labels. Substring ties resolve
/// deterministically: smallest length difference first, then lexicographically
/// smallest lowercased name.
pub fn resolve_label<'a>(label: &str, apps: &'a [AppInfo]) -> Option<&'a AppInfo> {
    let needle = label.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    if let Some(exact) = apps.iter().find(|app| app.name.to_lowercase() == needle) {
        return Some(exact);
    }

    apps.iter()
        .filter(|app| {
            let name = app.name.to_lowercase();
            name.contains(&needle) || needle.contains(&name)
        })
        .min_by_key(|app| {
            let name = app.name.to_lowercase();
            (name.len().abs_diff(needle.len()), name)
        })
}
