//! Shared Accessibility API plumbing: RAII for CoreFoundation references and
//! typed attribute reads off `AXUIElement`s.

use std::ffi::c_void;

use accessibility_sys::{
    kAXErrorSuccess, kAXPositionAttribute, kAXSizeAttribute, kAXValueTypeCGPoint,
    kAXValueTypeCGSize, AXUIElementCopyAttributeValue, AXUIElementRef, AXValueGetType,
    AXValueGetValue,
};
use core_foundation::base::{CFGetTypeID, CFTypeRef, TCFType};
use core_foundation::string::CFString;
use core_graphics::geometry::{CGPoint, CGSize};

use crate::dock::Rect;

/// RAII guard for CoreFoundation objects. Calls `CFRelease` on drop.
pub(crate) struct CfGuard(*mut c_void);

impl CfGuard {
    /// Take ownership of a raw CF pointer. Returns `None` if null.
    pub(crate) fn wrap(ptr: *mut c_void) -> Option<Self> {
        if ptr.is_null() {
            None
        } else {
            Some(Self(ptr))
        }
    }

    pub(crate) fn as_ptr(&self) -> *mut c_void {
        self.0
    }

    /// Reinterpret as a specific CF type pointer.
    pub(crate) fn as_type<T>(&self) -> *mut T {
        self.0 as *mut T
    }
}

impl Drop for CfGuard {
    fn drop(&mut self) {
        unsafe {
            core_foundation::base::CFRelease(self.0 as *const _);
        }
    }
}

/// Copy an attribute value, transferring ownership to the guard.
pub(crate) fn copy_attribute(element: AXUIElementRef, name: &str) -> Result<CfGuard, i32> {
    let attr = CFString::new(name);
    let mut value: CFTypeRef = std::ptr::null();
    let result =
        unsafe { AXUIElementCopyAttributeValue(element, attr.as_concrete_TypeRef(), &mut value) };
    if result != kAXErrorSuccess {
        return Err(result);
    }
    CfGuard::wrap(value as *mut _).ok_or(accessibility_sys::kAXErrorFailure)
}

/// Copy a string attribute. Missing, mistyped, or blank values become `None`.
pub(crate) fn copy_string(element: AXUIElementRef, name: &str) -> Option<String> {
    let guard = copy_attribute(element, name).ok()?;
    unsafe {
        if CFGetTypeID(guard.as_ptr() as _) != CFString::type_id() {
            return None;
        }
        // The guard owns the reference; wrap_under_get_rule adds a temporary
        // retain of its own.
        let value = CFString::wrap_under_get_rule(guard.as_ptr() as _).to_string();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

/// Read an element's position and size attributes as a screen rectangle.
/// Returns `None` for elements without usable geometry.
pub(crate) fn copy_frame(element: AXUIElementRef) -> Option<Rect> {
    unsafe {
        let pos_guard = copy_attribute(element, kAXPositionAttribute).ok()?;
        let size_guard = copy_attribute(element, kAXSizeAttribute).ok()?;

        let pos_ref = pos_guard.as_type::<accessibility_sys::__AXValue>();
        let size_ref = size_guard.as_type::<accessibility_sys::__AXValue>();

        if AXValueGetType(pos_ref) != kAXValueTypeCGPoint
            || AXValueGetType(size_ref) != kAXValueTypeCGSize
        {
            return None;
        }

        let mut pos = CGPoint::new(0.0, 0.0);
        let mut size = CGSize::new(0.0, 0.0);
        let ok_pos = AXValueGetValue(
            pos_ref,
            kAXValueTypeCGPoint,
            (&mut pos as *mut CGPoint).cast::<c_void>(),
        );
        let ok_size = AXValueGetValue(
            size_ref,
            kAXValueTypeCGSize,
            (&mut size as *mut CGSize).cast::<c_void>(),
        );

        if !ok_pos || !ok_size || size.width <= 0.0 || size.height <= 0.0 {
            return None;
        }

        Some(Rect::new(pos.x, pos.y, size.width, size.height))
    }
}
