//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events
//! to the logger. The hosting application's screen adapter implements
//! the same trait to drive dialogs and toasts.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::StageChanged { from, to } => {
                info!("STAGE | {} -> {}", from.name(), to.name());
            }
            AppEvent::PlanRejected(reason) => {
                warn!("PLAN  | rejected: {reason}");
            }
            AppEvent::PlanStarted { stops, merged } => {
                info!("PLAN  | started, stops={stops} merged={merged}");
            }
            AppEvent::DepartureBlocked => {
                warn!("SAFE  | doors not closed, departure aborted");
            }
            AppEvent::Arrived { destination } => {
                info!("NAV   | arrived at '{destination}', signalling occupant");
            }
            AppEvent::AuthAccepted => {
                info!("AUTH  | passcode accepted");
            }
            AppEvent::AuthRejected => {
                info!("AUTH  | passcode rejected");
            }
            AppEvent::MisroutedEscalated => {
                warn!("CARGO | misrouted item, all slots opened for inspection");
            }
            AppEvent::PickupDeferred { destination } => {
                info!("CARGO | pickup at '{destination}' deferred to base");
            }
            AppEvent::DoorStillOpen { retries } => {
                warn!("SAFE  | door still open, close reissued (check #{retries})");
            }
            AppEvent::DoorBlocked => {
                warn!("SAFE  | door blocked, please inspect");
            }
            AppEvent::NavigationFailed { code, message } => {
                warn!("NAV   | failed (code {code}): {message}");
            }
            AppEvent::Completed { pending_returns } => {
                if pending_returns.is_empty() {
                    info!("DONE  | trip complete");
                } else {
                    for record in pending_returns {
                        info!(
                            "DONE  | deferred pickup: '{}' ({:?} slot)",
                            record.destination, record.slot
                        );
                    }
                    info!(
                        "DONE  | trip complete, {} item(s) carried back",
                        pending_returns.len()
                    );
                }
            }
            AppEvent::PasscodeChanged => {
                info!("AUTH  | passcode changed");
            }
            AppEvent::PasscodeChangeRejected => {
                warn!("AUTH  | passcode change rejected");
            }
        }
    }
}
