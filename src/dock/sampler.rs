//! Reads icon geometry straight from the Dock process.
//!
//! The Dock exposes its icons through the Accessibility hierarchy as the
//! children of an `AXList` element; each child carries a title plus position
//! and size attributes in screen coordinates. Separators and folders appear
//! too, but their labels simply never resolve to a running application.

use accessibility_sys::{
    kAXChildrenAttribute, kAXRoleAttribute, kAXTitleAttribute, AXUIElementCreateApplication,
    AXUIElementGetTypeID, AXUIElementRef,
};
use core_foundation::array::{CFArrayGetCount, CFArrayGetValueAtIndex};
use core_foundation::base::CFGetTypeID;
use objc2_app_kit::NSRunningApplication;
use objc2_foundation::ns_string;
use tracing::trace;

use crate::ax::{copy_attribute, copy_frame, copy_string, CfGuard};

use super::{DockSampler, GeometryError, IconRegion};

const LIST_ROLE: &str = "AXList";

pub struct AxDockSampler;

impl AxDockSampler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AxDockSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl DockSampler for AxDockSampler {
    fn sample(&self) -> Result<Vec<IconRegion>, GeometryError> {
        let pid = dock_pid().ok_or(GeometryError::DockNotRunning)?;
        sample_dock(pid)
    }
}

fn dock_pid() -> Option<i32> {
    let apps =
        NSRunningApplication::runningApplicationsWithBundleIdentifier(ns_string!("com.apple.dock"));
    apps.to_vec().first().map(|app| app.processIdentifier())
}

fn sample_dock(pid: i32) -> Result<Vec<IconRegion>, GeometryError> {
    let raw = unsafe { AXUIElementCreateApplication(pid as libc::pid_t) };
    let app = CfGuard::wrap(raw as *mut _)
        .ok_or_else(|| GeometryError::Inspection("dock element unavailable".to_string()))?;
    let children = copy_attribute(app.as_type(), kAXChildrenAttribute).map_err(|code| {
        GeometryError::Inspection(format!("dock children query failed (AX error {code})"))
    })?;

    let mut regions = Vec::new();
    for child in array_elements(&children) {
        if copy_string(child, kAXRoleAttribute).as_deref() != Some(LIST_ROLE) {
            continue;
        }
        let Ok(icons) = copy_attribute(child, kAXChildrenAttribute) else {
            continue;
        };
        for icon in array_elements(&icons) {
            let Some(label) = copy_string(icon, kAXTitleAttribute) else {
                continue;
            };
            let Some(rect) = copy_frame(icon) else {
                continue;
            };
            trace!(label = %label, ?rect, "dock icon");
            regions.push(IconRegion::new(rect, label));
        }
    }
    Ok(regions)
}

/// The `AXUIElement` members of a CF array attribute value.
fn array_elements(guard: &CfGuard) -> Vec<AXUIElementRef> {
    unsafe {
        let array = guard.as_ptr() as _;
        let count = CFArrayGetCount(array);
        let ax_type_id = AXUIElementGetTypeID();
        (0..count)
            .map(|i| CFArrayGetValueAtIndex(array, i))
            .filter(|ptr| !ptr.is_null() && CFGetTypeID(*ptr) == ax_type_id)
            .map(|ptr| ptr as AXUIElementRef)
            .collect()
    }
}
