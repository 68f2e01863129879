//! Internal event channel and the coalescing refresh timer.
//!
//! Workspace notifications arrive as typed messages on one channel instead of
//! ad hoc delayed dispatches; the debouncer turns a burst of them into a
//! single geometry refresh once the dock has settled.

use std::time::{Duration, Instant};

/// Lifecycle signals consumed by the agent loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentEvent {
    AppLaunched,
    AppTerminated,
    SpaceChanged,
}

/// Trailing-edge coalescing timer.
///
/// Every signal pushes the deadline out by the quiet period; the deadline
/// fires once after the burst stops.
pub struct Debouncer {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    pub fn signal(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet);
    }

    /// True exactly once per settled burst: when a deadline is pending and has
    /// passed. Firing clears the deadline.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn pending(&self) -> bool {
        self.deadline.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn does_not_fire_without_signal() {
        let mut debouncer = Debouncer::new(ms(500));
        assert!(!debouncer.fire(Instant::now()));
        assert!(!debouncer.pending());
    }

    #[test]
    fn fires_once_after_quiet_period() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(ms(500));
        debouncer.signal(start);

        assert!(!debouncer.fire(start + ms(100)));
        assert!(debouncer.fire(start + ms(500)));
        assert!(!debouncer.fire(start + ms(600)));
    }

    #[test]
    fn burst_of_signals_coalesces_into_one_fire() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(ms(500));

        debouncer.signal(start);
        debouncer.signal(start + ms(200));
        debouncer.signal(start + ms(400));

        // The deadline tracks the last signal, not the first.
        assert!(!debouncer.fire(start + ms(500)));
        assert!(debouncer.fire(start + ms(900)));
    }

    #[test]
    fn separate_bursts_fire_separately() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(ms(500));

        debouncer.signal(start);
        assert!(debouncer.fire(start + ms(500)));

        debouncer.signal(start + ms(2000));
        assert!(!debouncer.fire(start + ms(2100)));
        assert!(debouncer.fire(start + ms(2500)));
    }
}
