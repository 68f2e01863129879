//! The agent: one instance constructed at process start, owning the tap
//! controller, the geometry cache, and the worker threads for everything too
//! slow for the input-dispatch path.
//!
//! The scheduler loop multiplexes three concerns over a single channel
//! receiver with a short tick: workspace events feeding the refresh debouncer,
//! the permission poll cadence, and tap self-healing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::apps::AppDirectory;
use crate::click::{self, Verdict};
use crate::config::Config;
use crate::dock::cache::GeometryCache;
use crate::dock::DockSampler;
use crate::events::{AgentEvent, Debouncer};
use crate::permission::{PermissionMonitor, PermissionProbe};
use crate::relaunch;
use crate::tap::{ClickDecider, ControllerAction, InterceptionController, TapFactory};
use crate::windows::{self, WindowSource};

/// How often the scheduler loop wakes up between events.
const SCHEDULER_TICK: Duration = Duration::from_millis(100);

/// Control handle usable from other threads while the agent loop runs.
#[derive(Clone)]
pub struct AgentHandle {
    running: Arc<AtomicBool>,
    events: Sender<AgentEvent>,
}

impl AgentHandle {
    pub fn events(&self) -> Sender<AgentEvent> {
        self.events.clone()
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

pub struct Agent {
    config: Config,
    controller: InterceptionController,
    monitor: PermissionMonitor,
    directory: Arc<dyn AppDirectory>,
    events_tx: Sender<AgentEvent>,
    events_rx: Receiver<AgentEvent>,
    refresh_tx: Sender<()>,
    toggle_tx: Sender<i32>,
    running: Arc<AtomicBool>,
    _workers: Vec<JoinHandle<()>>,
}

impl Agent {
    pub fn new(
        config: Config,
        probe: Box<dyn PermissionProbe>,
        sampler: Box<dyn DockSampler>,
        directory: Arc<dyn AppDirectory>,
        window_source: Arc<dyn WindowSource>,
        tap_factory: Box<dyn TapFactory>,
    ) -> Self {
        let started_untrusted = !probe.is_trusted();
        if started_untrusted {
            info!("accessibility permission missing, requesting it");
            probe.request();
        }

        let cache = Arc::new(GeometryCache::new());
        let (events_tx, events_rx) = mpsc::channel();
        let (refresh_tx, refresh_rx) = mpsc::channel::<()>();
        let (toggle_tx, toggle_rx) = mpsc::channel::<i32>();

        let refresh_worker = {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                while refresh_rx.recv().is_ok() {
                    cache.refresh_from(&*sampler);
                }
            })
        };

        let toggle_worker = {
            let directory = Arc::clone(&directory);
            let settle = config.settle_delay();
            let hide_delay = config.hide_delay();
            thread::spawn(move || {
                while let Ok(pid) = toggle_rx.recv() {
                    // Let any default activation the OS already started
                    // finish before touching window state.
                    thread::sleep(settle);
                    match windows::toggle_windows(&*window_source, pid) {
                        Ok(_) => {
                            thread::sleep(hide_delay);
                            if !directory.hide(pid) {
                                debug!(pid, "app hide refused or process gone");
                            }
                        }
                        Err(err) => warn!(pid, error = %err, "window toggle aborted"),
                    }
                }
            })
        };

        let decider: ClickDecider = {
            let cache = Arc::clone(&cache);
            let directory = Arc::clone(&directory);
            let toggle_tx = toggle_tx.clone();
            Arc::new(move |point| {
                let regions = cache.snapshot();
                let apps = directory.snapshot();
                match click::decide(point, &regions, &apps) {
                    Verdict::Suppress(app) => {
                        info!(app = %app.name, pid = app.pid, "dock click on frontmost app, toggling");
                        let _ = toggle_tx.send(app.pid);
                        true
                    }
                    Verdict::PassThrough => false,
                }
            })
        };

        let controller = InterceptionController::new(tap_factory, decider, started_untrusted);

        Self {
            config,
            controller,
            monitor: PermissionMonitor::new(probe),
            directory,
            events_tx,
            events_rx,
            refresh_tx,
            toggle_tx,
            running: Arc::new(AtomicBool::new(true)),
            _workers: vec![refresh_worker, toggle_worker],
        }
    }

    pub fn handle(&self) -> AgentHandle {
        AgentHandle {
            running: Arc::clone(&self.running),
            events: self.events_tx.clone(),
        }
    }

    /// Toggle the frontmost application on demand, mirroring the dock-click
    /// path (including the staged hide).
    pub fn toggle_frontmost(&self) {
        match self.directory.frontmost() {
            Some(app) if !app.is_hidden => {
                info!(app = %app.name, pid = app.pid, "manual toggle of frontmost app");
                let _ = self.toggle_tx.send(app.pid);
            }
            Some(app) => debug!(app = %app.name, "frontmost app already hidden"),
            None => debug!("no frontmost application to toggle"),
        }
    }

    /// Run the scheduler loop until the handle stops it.
    pub fn run(mut self) {
        info!("agent running");
        let mut debouncer = Debouncer::new(self.config.geometry_debounce());
        let mut next_poll = Instant::now();

        // Initial sample so the very first click has regions to match.
        let _ = self.refresh_tx.send(());

        while self.running.load(Ordering::SeqCst) {
            match self.events_rx.recv_timeout(SCHEDULER_TICK) {
                Ok(event) => {
                    debug!(?event, "workspace event");
                    debouncer.signal(Instant::now());
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            let now = Instant::now();
            if debouncer.fire(now) {
                let _ = self.refresh_tx.send(());
            }

            if now >= next_poll {
                next_poll = now + self.config.permission_poll_interval();
                match self.monitor.poll() {
                    Some(transition) => {
                        if self.controller.apply(transition) == ControllerAction::Relaunch {
                            self.relaunch_and_exit();
                        }
                    }
                    None => self.controller.tick(self.monitor.last_observed()),
                }
            }
        }
        info!("agent stopped");
    }

    /// Spawn the agent loop on its own thread.
    pub fn start(self) -> JoinHandle<()> {
        thread::spawn(move || self.run())
    }

    fn relaunch_and_exit(&self) {
        info!("permission granted after untrusted start, relaunching");
        match relaunch::spawn_relauncher() {
            Ok(()) => {
                thread::sleep(Duration::from_millis(500));
                std::process::exit(0);
            }
            Err(err) => {
                error!(error = %err, "automatic relaunch failed; quit and reopen docktoggle manually");
            }
        }
    }
}
