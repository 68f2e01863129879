//! Suppressing event tap driver.
//!
//! The tap lives on its own thread with its own run loop; the callback runs
//! inline with system input dispatch and must return NULL to consume an
//! event, which the safe `CGEventTap` wrapper cannot express, so the tap is
//! created through the raw API. The callback receives an opaque token that is
//! resolved back to the tap's state through a process-wide registry; no
//! object pointer ever crosses the FFI boundary.

use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use core_foundation::base::TCFType;
use core_foundation::mach_port::CFMachPort;
use core_foundation::runloop::{
    kCFRunLoopCommonModes, kCFRunLoopDefaultMode, CFRunLoop, CFRunLoopRunResult,
};
use core_graphics::event::CGEventType;
use core_graphics::geometry::CGPoint;
use tracing::warn;

use crate::dock::Point;

use super::{ClickDecider, EventTap, TapError, TapFactory};

type CGEventRef = *mut c_void;
type RawMachPortRef = *mut c_void;

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGEventTapCreate(
        tap: u32,
        place: u32,
        options: u32,
        events_of_interest: u64,
        callback: unsafe extern "C" fn(*mut c_void, u32, CGEventRef, *mut c_void) -> CGEventRef,
        user_info: *mut c_void,
    ) -> RawMachPortRef;
    fn CGEventTapEnable(tap: RawMachPortRef, enable: bool);
    fn CGEventGetLocation(event: CGEventRef) -> CGPoint;
}

#[link(name = "CoreFoundation", kind = "framework")]
extern "C" {
    fn CFMachPortInvalidate(port: RawMachPortRef);
}

// kCGHIDEventTap / kCGHeadInsertEventTap / kCGEventTapOptionDefault
const TAP_LOCATION_HID: u32 = 0;
const TAP_PLACE_HEAD_INSERT: u32 = 0;
const TAP_OPTION_DEFAULT: u32 = 0;

// Synthetic event types delivered when the OS disables a tap behind our back.
const EVENT_TAP_DISABLED_BY_TIMEOUT: u32 = 0xFFFF_FFFE;
const EVENT_TAP_DISABLED_BY_USER_INPUT: u32 = 0xFFFF_FFFF;

struct TapShared {
    decider: ClickDecider,
    alive: Arc<AtomicBool>,
}

static REGISTRY: OnceLock<Mutex<HashMap<usize, TapShared>>> = OnceLock::new();
static NEXT_TOKEN: AtomicUsize = AtomicUsize::new(1);

fn registry() -> &'static Mutex<HashMap<usize, TapShared>> {
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

unsafe extern "C" fn tap_callback(
    _proxy: *mut c_void,
    event_type: u32,
    event: CGEventRef,
    user_info: *mut c_void,
) -> CGEventRef {
    let token = user_info as usize;
    let entry = {
        let Ok(map) = registry().lock() else {
            return event;
        };
        map.get(&token)
            .map(|shared| (Arc::clone(&shared.decider), Arc::clone(&shared.alive)))
    };
    let Some((decider, alive)) = entry else {
        return event;
    };

    if event_type == EVENT_TAP_DISABLED_BY_TIMEOUT
        || event_type == EVENT_TAP_DISABLED_BY_USER_INPUT
    {
        // Mark the tap dead; the controller recreates it on its next tick.
        alive.store(false, Ordering::SeqCst);
        return event;
    }

    if event_type == CGEventType::LeftMouseDown as u32 && !event.is_null() {
        let location = CGEventGetLocation(event);
        if decider(Point::new(location.x, location.y)) {
            return std::ptr::null_mut();
        }
    }
    event
}

pub struct CgTapFactory;

impl CgTapFactory {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CgTapFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl TapFactory for CgTapFactory {
    fn install(&self, decider: ClickDecider) -> Result<Box<dyn EventTap>, TapError> {
        CgEventTap::start(decider).map(|tap| Box::new(tap) as Box<dyn EventTap>)
    }
}

pub struct CgEventTap {
    running: Arc<AtomicBool>,
    alive: Arc<AtomicBool>,
    run_loop: Arc<Mutex<Option<CFRunLoop>>>,
    token: usize,
    handle: Option<JoinHandle<()>>,
}

impl CgEventTap {
    /// Create the tap on a background thread and wait for setup to finish.
    fn start(decider: ClickDecider) -> Result<Self, TapError> {
        let token = NEXT_TOKEN.fetch_add(1, Ordering::SeqCst);
        let alive = Arc::new(AtomicBool::new(true));
        let running = Arc::new(AtomicBool::new(true));
        registry().lock().unwrap().insert(
            token,
            TapShared {
                decider,
                alive: Arc::clone(&alive),
            },
        );

        let (setup_tx, setup_rx) = mpsc::channel::<Result<(), TapError>>();
        let run_loop_holder: Arc<Mutex<Option<CFRunLoop>>> = Arc::new(Mutex::new(None));

        let thread_running = Arc::clone(&running);
        let thread_alive = Arc::clone(&alive);
        let thread_holder = Arc::clone(&run_loop_holder);
        let handle = thread::spawn(move || {
            run_tap_loop(token, thread_running, thread_alive, setup_tx, thread_holder);
        });

        let mut tap = Self {
            running,
            alive,
            run_loop: run_loop_holder,
            token,
            handle: Some(handle),
        };

        match setup_rx.recv_timeout(Duration::from_secs(5)) {
            Ok(Ok(())) => Ok(tap),
            Ok(Err(err)) => {
                tap.shutdown();
                Err(err)
            }
            Err(_) => {
                tap.shutdown();
                Err(TapError::SetupTimeout)
            }
        }
    }
}

fn run_tap_loop(
    token: usize,
    running: Arc<AtomicBool>,
    alive: Arc<AtomicBool>,
    setup_tx: Sender<Result<(), TapError>>,
    run_loop_holder: Arc<Mutex<Option<CFRunLoop>>>,
) {
    let mask: u64 = 1u64 << (CGEventType::LeftMouseDown as u64);

    let port = unsafe {
        CGEventTapCreate(
            TAP_LOCATION_HID,
            TAP_PLACE_HEAD_INSERT,
            TAP_OPTION_DEFAULT,
            mask,
            tap_callback,
            token as *mut c_void,
        )
    };
    if port.is_null() {
        alive.store(false, Ordering::SeqCst);
        let _ = setup_tx.send(Err(TapError::CreationFailed));
        return;
    }
    let mach_port = unsafe { CFMachPort::wrap_under_create_rule(port as _) };

    let source = match mach_port.create_runloop_source(0) {
        Ok(source) => source,
        Err(()) => {
            unsafe { CFMachPortInvalidate(port) };
            alive.store(false, Ordering::SeqCst);
            let _ = setup_tx.send(Err(TapError::RunLoopSourceFailed));
            return;
        }
    };

    let current = CFRunLoop::get_current();
    {
        let mut holder = run_loop_holder.lock().unwrap();
        *holder = Some(current.clone());
    }

    unsafe {
        current.add_source(&source, kCFRunLoopCommonModes);
        CGEventTapEnable(port, true);
    }
    let _ = setup_tx.send(Ok(()));

    // Pump with a short timeout so the running flag is honored even if the
    // run loop is never stopped explicitly.
    while running.load(Ordering::SeqCst) {
        let result =
            unsafe { CFRunLoop::run_in_mode(kCFRunLoopDefaultMode, Duration::from_millis(100), true) };
        if result == CFRunLoopRunResult::Stopped {
            break;
        }
    }

    // Disable and invalidate before the port reference is dropped.
    unsafe {
        CGEventTapEnable(port, false);
        current.remove_source(&source, kCFRunLoopCommonModes);
        CFMachPortInvalidate(port);
    }
    alive.store(false, Ordering::SeqCst);
}

impl EventTap for CgEventTap {
    fn is_alive(&self) -> bool {
        self.running.load(Ordering::SeqCst) && self.alive.load(Ordering::SeqCst)
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Ok(holder) = self.run_loop.lock() {
            if let Some(run_loop) = holder.as_ref() {
                run_loop.stop();
            }
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("event tap thread panicked during shutdown");
            }
        }
        if let Ok(mut map) = registry().lock() {
            map.remove(&self.token);
        }
        self.alive.store(false, Ordering::SeqCst);
    }
}

impl Drop for CgEventTap {
    fn drop(&mut self) {
        self.shutdown();
    }
}
