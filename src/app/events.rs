//! Outbound application events.
//!
//! The [`DeliveryService`](super::service::DeliveryService) emits
//! these through the [`EventSink`](super::ports::EventSink) port.
//! Adapters on the other side decide what to do with them — log them,
//! refresh the operator screen, raise a dialog. Safety warnings
//! (doors not closing, blocked leaves) always come through here so a
//! human sees every retry.

use crate::mission::Stage;
use crate::mission::plan::{PendingReturn, PlanError};

/// Structured events emitted by the workflow core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The orchestrator moved between stages.
    StageChanged { from: Stage, to: Stage },

    /// A plan could not be started.
    PlanRejected(PlanRejection),

    /// A plan was accepted and the pre-departure check began.
    PlanStarted { stops: usize, merged: bool },

    /// The pre-departure check found a door not closed; no navigation
    /// was attempted.
    DepartureBlocked,

    /// The robot reached a stop and the occupant is being signalled.
    Arrived { destination: String },

    /// Passcode accepted; the stop's door is opening.
    AuthAccepted,

    /// Passcode rejected; the prompt stays up.
    AuthRejected,

    /// Misrouted-item report verified; all slots opened.
    MisroutedEscalated,

    /// A pickup was deferred back to base.
    PickupDeferred { destination: String },

    /// Close-verify found a door still open; the close command was
    /// reissued. One of these per retry — never silent.
    DoorStillOpen { retries: u32 },

    /// The door unit reported a blocked or jammed leaf.
    DoorBlocked,

    /// A navigation leg failed; the plan was abandoned.
    NavigationFailed { code: i32, message: String },

    /// The trip finished. Carries any deferred pickups for the
    /// operator to reconcile.
    Completed { pending_returns: Vec<PendingReturn> },

    /// The stored passcode was replaced.
    PasscodeChanged,

    /// A passcode change was refused (old value mismatch).
    PasscodeChangeRejected,
}

/// Why a `StartPlan` command was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanRejection {
    /// Another plan is already running.
    PlanActive,
    /// The request itself was invalid.
    BadPlan(PlanError),
}

impl core::fmt::Display for PlanRejection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PlanActive => write!(f, "a plan is already active"),
            Self::BadPlan(e) => write!(f, "{e}"),
        }
    }
}
