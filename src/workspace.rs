//! Workspace lifecycle notifications.
//!
//! App launches, terminations, and space changes all invalidate the dock
//! geometry; each subscription forwards a typed event into the agent channel
//! and the agent's debouncer decides when to resample. Block-based observer
//! tokens are kept and removed on drop.

use std::sync::mpsc::Sender;

use block2::StackBlock;
use objc2::msg_send;
use objc2::rc::Retained;
use objc2_app_kit::NSWorkspace;
use objc2_foundation::{NSNotification, NSNotificationCenter, NSObject, NSString};
use tracing::debug;

use crate::events::AgentEvent;

const DID_LAUNCH_APP: &str = "NSWorkspaceDidLaunchApplicationNotification";
const DID_TERMINATE_APP: &str = "NSWorkspaceDidTerminateApplicationNotification";
const ACTIVE_SPACE_CHANGED: &str = "NSWorkspaceActiveSpaceDidChangeNotification";

pub struct WorkspaceObserver {
    center: Retained<NSNotificationCenter>,
    tokens: Vec<Retained<NSObject>>,
}

impl WorkspaceObserver {
    /// Subscribe to the lifecycle notifications that change dock geometry.
    pub fn install(events: Sender<AgentEvent>) -> Self {
        let workspace = NSWorkspace::sharedWorkspace();
        let center = unsafe { workspace.notificationCenter() };

        let mut observer = Self {
            center,
            tokens: Vec::new(),
        };
        observer.subscribe(DID_LAUNCH_APP, AgentEvent::AppLaunched, &events);
        observer.subscribe(DID_TERMINATE_APP, AgentEvent::AppTerminated, &events);
        observer.subscribe(ACTIVE_SPACE_CHANGED, AgentEvent::SpaceChanged, &events);
        observer
    }

    fn subscribe(&mut self, name: &str, event: AgentEvent, events: &Sender<AgentEvent>) {
        let sender = events.clone();
        let block = StackBlock::new(move |_note: *mut NSNotification| {
            debug!(?event, "workspace notification");
            let _ = sender.send(event);
        })
        .copy();

        let name = NSString::from_str(name);
        let token: Retained<NSObject> = unsafe {
            msg_send![
                &*self.center,
                addObserverForName: &*name,
                object: std::ptr::null::<NSObject>(),
                queue: std::ptr::null::<NSObject>(),
                usingBlock: &*block
            ]
        };
        self.tokens.push(token);
    }
}

impl Drop for WorkspaceObserver {
    fn drop(&mut self) {
        for token in self.tokens.drain(..) {
            unsafe {
                let _: () = msg_send![&*self.center, removeObserver: &*token];
            }
        }
    }
}
