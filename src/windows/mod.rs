//! Window minimize/restore toggling.
//!
//! The toggle is a strict two-state switch even for multi-window apps: if any
//! window is visible, one invocation minimizes everything; only a fully
//! minimized set gets restored. Reads happen in a separate pass before any
//! mutation, so a failed attribute read aborts the invocation with nothing
//! half-done.

#[cfg(target_os = "macos")]
pub mod macos;

use std::fmt;

use tracing::debug;

#[derive(Debug)]
pub enum WindowError {
    Enumeration(i32),
    AttributeRead(i32),
    AttributeWrite(i32),
}

impl fmt::Display for WindowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowError::Enumeration(code) => {
                write!(f, "window enumeration failed (AX error {code})")
            }
            WindowError::AttributeRead(code) => {
                write!(f, "window attribute read failed (AX error {code})")
            }
            WindowError::AttributeWrite(code) => {
                write!(f, "window attribute write failed (AX error {code})")
            }
        }
    }
}

impl std::error::Error for WindowError {}

/// One window of a running application. Handles are transactional: they are
/// enumerated, inspected, and mutated within a single toggle invocation and
/// never retained across invocations.
pub trait WindowHandle {
    fn is_minimized(&self) -> Result<bool, WindowError>;
    fn set_minimized(&self, minimized: bool) -> Result<(), WindowError>;
}

/// Window enumeration seam, keyed by process id.
pub trait WindowSource: Send + Sync {
    fn windows(&self, pid: i32) -> Result<Vec<Box<dyn WindowHandle>>, WindowError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    MinimizedAll,
    RestoredAll,
    NoWindows,
}

/// Toggle every window of the given process between minimized and restored.
///
/// Minimize wins on mixed sets: any visible window forces a minimize-all pass,
/// so one click always collapses everything and the next click restores
/// everything. Windows already in the target state are left untouched.
pub fn toggle_windows(source: &dyn WindowSource, pid: i32) -> Result<ToggleOutcome, WindowError> {
    let windows = source.windows(pid)?;
    if windows.is_empty() {
        debug!(pid, "no windows to toggle");
        return Ok(ToggleOutcome::NoWindows);
    }

    // Read pass: collect every state up front so a read failure aborts
    // before the first write.
    let mut minimized = Vec::with_capacity(windows.len());
    for window in &windows {
        minimized.push(window.is_minimized()?);
    }
    let any_visible = minimized.iter().any(|m| !m);

    for (window, is_min) in windows.iter().zip(&minimized) {
        if any_visible && !is_min {
            window.set_minimized(true)?;
        } else if !any_visible && *is_min {
            window.set_minimized(false)?;
        }
    }

    let outcome = if any_visible {
        ToggleOutcome::MinimizedAll
    } else {
        ToggleOutcome::RestoredAll
    };
    debug!(pid, ?outcome, windows = windows.len(), "toggled windows");
    Ok(outcome)
}
