//! Ownership and lifecycle of the input-event tap.
//!
//! The controller is the only component allowed to create, enable, or destroy
//! the tap. It is a two-state machine driven by permission transitions and
//! poll ticks: `Disabled` (no tap installed) and `Active` (tap installed and
//! receiving events). Creation is idempotent; an existing tap is always fully
//! torn down first, so at most one tap resource is ever alive.

#[cfg(target_os = "macos")]
pub mod macos;

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::dock::Point;
use crate::permission::Transition;

#[derive(Debug)]
pub enum TapError {
    CreationFailed,
    RunLoopSourceFailed,
    SetupTimeout,
}

impl fmt::Display for TapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TapError::CreationFailed => write!(f, "event tap creation failed"),
            TapError::RunLoopSourceFailed => write!(f, "run loop source creation failed"),
            TapError::SetupTimeout => write!(f, "timed out waiting for event tap setup"),
        }
    }
}

impl std::error::Error for TapError {}

/// Synchronous per-click decision: returns true to consume the event.
/// Runs inline with system input dispatch and must not block.
pub type ClickDecider = Arc<dyn Fn(Point) -> bool + Send + Sync>;

/// A live tap resource. Shutdown disables and invalidates the underlying
/// hook before the handle is discarded.
pub trait EventTap: Send {
    /// False once the OS has silently killed the tap (or shutdown ran).
    fn is_alive(&self) -> bool;

    /// Disable and invalidate. Idempotent.
    fn shutdown(&mut self);
}

pub trait TapFactory: Send {
    fn install(&self, decider: ClickDecider) -> Result<Box<dyn EventTap>, TapError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapState {
    Disabled,
    Active,
}

/// Action the caller must carry out after a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerAction {
    None,
    /// The process started untrusted and has just been granted permission;
    /// observation state can only be rebuilt from process start, so a full
    /// relaunch is required. Requested at most once per process lifetime.
    Relaunch,
}

pub struct InterceptionController {
    factory: Box<dyn TapFactory>,
    decider: ClickDecider,
    tap: Option<Box<dyn EventTap>>,
    needs_relaunch: bool,
}

impl InterceptionController {
    /// `started_untrusted` records whether permission was absent at process
    /// start; the first grant after such a start requests a relaunch.
    pub fn new(factory: Box<dyn TapFactory>, decider: ClickDecider, started_untrusted: bool) -> Self {
        Self {
            factory,
            decider,
            tap: None,
            needs_relaunch: started_untrusted,
        }
    }

    pub fn state(&self) -> TapState {
        match &self.tap {
            Some(tap) if tap.is_alive() => TapState::Active,
            _ => TapState::Disabled,
        }
    }

    pub fn apply(&mut self, transition: Transition) -> ControllerAction {
        match transition {
            Transition::Granted => {
                info!("accessibility permission granted, installing event tap");
                self.install();
                if self.needs_relaunch && self.tap.is_some() {
                    self.needs_relaunch = false;
                    return ControllerAction::Relaunch;
                }
                ControllerAction::None
            }
            Transition::Revoked => {
                info!("accessibility permission revoked, removing event tap");
                self.teardown();
                ControllerAction::None
            }
        }
    }

    /// Steady-state poll tick. Re-creates the tap when permission is present
    /// but the tap has silently died or a previous creation attempt failed.
    pub fn tick(&mut self, trusted: bool) {
        if !trusted {
            return;
        }
        if self.state() == TapState::Disabled {
            if self.tap.is_some() {
                warn!("event tap died, recreating");
            }
            self.install();
        }
    }

    /// Install a fresh tap, tearing down any existing one first.
    fn install(&mut self) {
        self.teardown();
        match self.factory.install(Arc::clone(&self.decider)) {
            Ok(tap) => {
                self.tap = Some(tap);
                info!("event tap installed");
            }
            Err(err) => {
                warn!(error = %err, "event tap installation failed, will retry");
            }
        }
    }

    fn teardown(&mut self) {
        if let Some(mut tap) = self.tap.take() {
            tap.shutdown();
        }
    }
}

impl Drop for InterceptionController {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Shared bookkeeping: `live` counts tap resources that exist and have
    /// not been torn down (a silently dead tap still counts until shutdown).
    #[derive(Default)]
    struct FactoryState {
        live: AtomicUsize,
        installs: AtomicUsize,
        fail_next: AtomicBool,
        last_alive: Mutex<Option<Arc<AtomicBool>>>,
    }

    impl FactoryState {
        /// Simulate the OS silently killing the current tap.
        fn kill_current_tap(&self) {
            if let Some(alive) = self.last_alive.lock().unwrap().as_ref() {
                alive.store(false, Ordering::SeqCst);
            }
        }
    }

    struct CountingTap {
        state: Arc<FactoryState>,
        alive: Arc<AtomicBool>,
        shut_down: bool,
    }

    impl EventTap for CountingTap {
        fn is_alive(&self) -> bool {
            self.alive.load(Ordering::SeqCst)
        }

        fn shutdown(&mut self) {
            if !self.shut_down {
                self.shut_down = true;
                self.alive.store(false, Ordering::SeqCst);
                self.state.live.fetch_sub(1, Ordering::SeqCst);
            }
        }
    }

    impl Drop for CountingTap {
        fn drop(&mut self) {
            // Detect a handle discarded without teardown.
            assert!(self.shut_down, "tap dropped while still enabled");
        }
    }

    struct CountingFactory(Arc<FactoryState>);

    impl TapFactory for CountingFactory {
        fn install(&self, _decider: ClickDecider) -> Result<Box<dyn EventTap>, TapError> {
            self.0.installs.fetch_add(1, Ordering::SeqCst);
            if self.0.fail_next.swap(false, Ordering::SeqCst) {
                return Err(TapError::CreationFailed);
            }
            self.0.live.fetch_add(1, Ordering::SeqCst);
            let alive = Arc::new(AtomicBool::new(true));
            *self.0.last_alive.lock().unwrap() = Some(Arc::clone(&alive));
            Ok(Box::new(CountingTap {
                state: Arc::clone(&self.0),
                alive,
                shut_down: false,
            }))
        }
    }

    fn controller(started_untrusted: bool) -> (InterceptionController, Arc<FactoryState>) {
        let state = Arc::new(FactoryState::default());
        let factory = CountingFactory(Arc::clone(&state));
        let decider: ClickDecider = Arc::new(|_| false);
        (
            InterceptionController::new(Box::new(factory), decider, started_untrusted),
            state,
        )
    }

    #[test]
    fn starts_disabled() {
        let (controller, state) = controller(false);
        assert_eq!(controller.state(), TapState::Disabled);
        assert_eq!(state.live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn grant_installs_tap() {
        let (mut controller, state) = controller(false);
        let action = controller.apply(Transition::Granted);
        assert_eq!(action, ControllerAction::None);
        assert_eq!(controller.state(), TapState::Active);
        assert_eq!(state.live.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn revoke_tears_down_tap() {
        let (mut controller, state) = controller(false);
        controller.apply(Transition::Granted);
        controller.apply(Transition::Revoked);
        assert_eq!(controller.state(), TapState::Disabled);
        assert_eq!(state.live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn repeated_grants_leave_exactly_one_live_tap() {
        let (mut controller, state) = controller(false);
        controller.apply(Transition::Granted);
        controller.apply(Transition::Granted);
        controller.apply(Transition::Granted);
        assert_eq!(state.live.load(Ordering::SeqCst), 1);
        assert_eq!(state.installs.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn tick_recreates_dead_tap() {
        let (mut controller, state) = controller(false);
        controller.apply(Transition::Granted);
        state.kill_current_tap();
        assert_eq!(controller.state(), TapState::Disabled);

        controller.tick(true);
        assert_eq!(controller.state(), TapState::Active);
        assert_eq!(state.live.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn tick_without_permission_does_nothing() {
        let (mut controller, state) = controller(false);
        controller.tick(false);
        assert_eq!(controller.state(), TapState::Disabled);
        assert_eq!(state.installs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn tick_with_healthy_tap_does_not_reinstall() {
        let (mut controller, state) = controller(false);
        controller.apply(Transition::Granted);
        controller.tick(true);
        controller.tick(true);
        assert_eq!(state.installs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_creation_retries_on_next_tick() {
        let (mut controller, state) = controller(false);
        state.fail_next.store(true, Ordering::SeqCst);
        controller.apply(Transition::Granted);
        assert_eq!(controller.state(), TapState::Disabled);

        controller.tick(true);
        assert_eq!(controller.state(), TapState::Active);
    }

    #[test]
    fn grant_after_untrusted_start_requests_relaunch_once() {
        let (mut controller, _) = controller(true);
        assert_eq!(
            controller.apply(Transition::Granted),
            ControllerAction::Relaunch
        );
        // Later cycles never request it again.
        controller.apply(Transition::Revoked);
        assert_eq!(controller.apply(Transition::Granted), ControllerAction::None);
    }

    #[test]
    fn trusted_start_never_requests_relaunch() {
        let (mut controller, _) = controller(false);
        assert_eq!(controller.apply(Transition::Granted), ControllerAction::None);
    }

    #[test]
    fn failed_install_defers_relaunch_to_successful_one() {
        let (mut controller, state) = controller(true);
        state.fail_next.store(true, Ordering::SeqCst);
        assert_eq!(controller.apply(Transition::Granted), ControllerAction::None);
        assert_eq!(
            controller.apply(Transition::Granted),
            ControllerAction::Relaunch
        );
    }

    #[test]
    fn drop_tears_down_live_tap() {
        let state = {
            let (mut controller, state) = controller(false);
            controller.apply(Transition::Granted);
            state
        };
        assert_eq!(state.live.load(Ordering::SeqCst), 0);
    }
}
