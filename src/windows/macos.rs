//! Accessibility-backed window handles.
//!
//! Windows are enumerated through the target application's `AXUIElement` and
//! mutated through the minimized attribute. Handles hold their own retained
//! references and never outlive the toggle invocation that created them.

use accessibility_sys::{
    kAXErrorFailure, kAXErrorSuccess, kAXMinimizedAttribute, kAXWindowsAttribute,
    AXUIElementCreateApplication, AXUIElementGetTypeID, AXUIElementSetAttributeValue,
};
use core_foundation::array::{CFArrayGetCount, CFArrayGetValueAtIndex};
use core_foundation::base::{CFGetTypeID, CFRetain, TCFType};
use core_foundation::boolean::CFBoolean;
use core_foundation::string::CFString;

use crate::ax::{copy_attribute, CfGuard};

use super::{WindowError, WindowHandle, WindowSource};

pub struct AxWindowSource;

impl AxWindowSource {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AxWindowSource {
    fn default() -> Self {
        Self::new()
    }
}

struct AxWindow {
    element: CfGuard,
}

impl WindowHandle for AxWindow {
    fn is_minimized(&self) -> Result<bool, WindowError> {
        let guard = copy_attribute(self.element.as_type(), kAXMinimizedAttribute)
            .map_err(WindowError::AttributeRead)?;
        unsafe {
            if CFGetTypeID(guard.as_ptr() as _) != CFBoolean::type_id() {
                return Err(WindowError::AttributeRead(kAXErrorFailure));
            }
            let value = CFBoolean::wrap_under_get_rule(guard.as_ptr() as _);
            Ok(value == CFBoolean::true_value())
        }
    }

    fn set_minimized(&self, minimized: bool) -> Result<(), WindowError> {
        let attr = CFString::new(kAXMinimizedAttribute);
        let value = if minimized {
            CFBoolean::true_value()
        } else {
            CFBoolean::false_value()
        };
        let result = unsafe {
            AXUIElementSetAttributeValue(
                self.element.as_type(),
                attr.as_concrete_TypeRef(),
                value.as_CFTypeRef(),
            )
        };
        if result != kAXErrorSuccess {
            return Err(WindowError::AttributeWrite(result));
        }
        Ok(())
    }
}

impl WindowSource for AxWindowSource {
    fn windows(&self, pid: i32) -> Result<Vec<Box<dyn WindowHandle>>, WindowError> {
        let raw = unsafe { AXUIElementCreateApplication(pid as libc::pid_t) };
        let app = CfGuard::wrap(raw as *mut _).ok_or(WindowError::Enumeration(kAXErrorFailure))?;
        let list =
            copy_attribute(app.as_type(), kAXWindowsAttribute).map_err(WindowError::Enumeration)?;

        unsafe {
            let count = CFArrayGetCount(list.as_ptr() as _);
            let ax_type_id = AXUIElementGetTypeID();
            let mut windows: Vec<Box<dyn WindowHandle>> = Vec::with_capacity(count.max(0) as usize);
            for i in 0..count {
                let element = CFArrayGetValueAtIndex(list.as_ptr() as _, i);
                if element.is_null() || CFGetTypeID(element) != ax_type_id {
                    continue;
                }
                // Retain past the array's lifetime; the guard releases.
                CFRetain(element);
                let Some(guard) = CfGuard::wrap(element as *mut _) else {
                    continue;
                };
                windows.push(Box::new(AxWindow { element: guard }));
            }
            Ok(windows)
        }
    }
}