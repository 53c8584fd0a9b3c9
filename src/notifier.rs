//! Occupant notifier loop.
//!
//! While the robot waits at a stop for someone to enter the passcode,
//! the buzzer at that destination is signalled once immediately and
//! then again on a fixed interval until the loop is cancelled. At most
//! one loop is live per orchestrator — starting a new one replaces the
//! old, enforced by this struct owning the only loop state.
//!
//! The loop is tick-counted by the control loop rather than running
//! its own timer thread, so cancellation is immediate and there is
//! nothing to race against.
//!
//! ## Overlap policy
//!
//! A fire does not wait for the signal action to finish. Overlap is
//! prevented by the timing margin — one signal sequence (~6.2 s) is
//! far shorter than the interval (30 s) — and, should an adapter ever
//! be slower than that, the device worker's exclusive queue serialises
//! the writes anyway. See `notify_interval_covers_signal_duration` in
//! the config tests for the margin check.

use log::info;

/// Repeating "signal occupant" loop, tick-driven.
pub struct Notifier {
    interval_ticks: u32,
    elapsed: u32,
    /// Destination label of the live loop, `None` when stopped.
    target: Option<String>,
}

impl Notifier {
    pub fn new(interval_ticks: u32) -> Self {
        Self {
            interval_ticks: interval_ticks.max(1),
            elapsed: 0,
            target: None,
        }
    }

    /// Start a loop for `destination`, replacing any running loop.
    /// The first signal is due immediately; the caller fires it right
    /// after this returns.
    pub fn start(&mut self, destination: &str) {
        if let Some(prev) = &self.target {
            info!("notifier: replacing loop for '{prev}' with '{destination}'");
        } else {
            info!("notifier: loop started for '{destination}'");
        }
        self.elapsed = 0;
        self.target = Some(destination.to_string());
    }

    /// Cancel the loop. Idempotent; safe with no loop active.
    pub fn stop(&mut self) {
        if let Some(prev) = self.target.take() {
            info!("notifier: loop stopped for '{prev}'");
        }
        self.elapsed = 0;
    }

    pub fn is_active(&self) -> bool {
        self.target.is_some()
    }

    /// Advance one control tick. Returns the destination when a repeat
    /// signal is due this tick.
    pub fn poll(&mut self) -> Option<&str> {
        self.target.as_ref()?;
        self.elapsed += 1;
        if self.elapsed >= self.interval_ticks {
            self.elapsed = 0;
            self.target.as_deref()
        } else {
            None
        }
    }
}
