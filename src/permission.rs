//! Accessibility permission polling with edge-triggered transition reporting.
//!
//! There is no push notification for trust changes, so the agent polls the
//! trust flag on a fixed cadence and reacts only to edges. Polling itself is
//! the resilience mechanism: the underlying query is an infallible boolean.

/// Trust query seam. The system implementation answers for the current
/// process; tests substitute scripted probes.
pub trait PermissionProbe: Send {
    fn is_trusted(&self) -> bool;

    /// Show the system permission prompt. Called at most once per process
    /// lifetime, when the agent starts untrusted.
    fn request(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Granted,
    Revoked,
}

/// Edge detector over the trust flag.
///
/// The baseline starts at `false`, so a process that is already trusted at
/// launch observes `Granted` on its first poll and arms immediately.
pub struct PermissionMonitor {
    probe: Box<dyn PermissionProbe>,
    last: bool,
}

impl PermissionMonitor {
    pub fn new(probe: Box<dyn PermissionProbe>) -> Self {
        Self { probe, last: false }
    }

    /// Query the probe once, reporting a transition only when the observed
    /// value differs from the previous observation.
    pub fn poll(&mut self) -> Option<Transition> {
        let trusted = self.probe.is_trusted();
        if trusted == self.last {
            return None;
        }
        self.last = trusted;
        if trusted {
            Some(Transition::Granted)
        } else {
            Some(Transition::Revoked)
        }
    }

    /// The value seen by the most recent poll.
    pub fn last_observed(&self) -> bool {
        self.last
    }

    pub fn trusted_now(&self) -> bool {
        self.probe.is_trusted()
    }

    pub fn request_prompt(&self) {
        self.probe.request();
    }
}

/// Probe backed by the accessibility trust API.
#[cfg(target_os = "macos")]
pub struct SystemPermissionProbe;

#[cfg(target_os = "macos")]
impl PermissionProbe for SystemPermissionProbe {
    fn is_trusted(&self) -> bool {
        unsafe { accessibility_sys::AXIsProcessTrusted() }
    }

    fn request(&self) {
        use accessibility_sys::{kAXTrustedCheckOptionPrompt, AXIsProcessTrustedWithOptions};
        use core_foundation::base::TCFType;
        use core_foundation::boolean::CFBoolean;
        use core_foundation::dictionary::CFDictionary;
        use core_foundation::string::CFString;

        unsafe {
            let key = CFString::wrap_under_get_rule(kAXTrustedCheckOptionPrompt);
            let options = CFDictionary::from_CFType_pairs(&[(
                key.as_CFType(),
                CFBoolean::true_value().as_CFType(),
            )]);
            AXIsProcessTrustedWithOptions(options.as_concrete_TypeRef());
        }
    }
}
