//! Inbound commands to the delivery service.
//!
//! These represent actions requested by the outside world (operator
//! screen, remote console) that the
//! [`DeliveryService`](super::service::DeliveryService) interprets and
//! acts upon. Passcodes arrive inside the command — the service never
//! drives a dialog itself.

use crate::mission::plan::StopRequest;

/// Commands that external adapters can send into the workflow core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Begin a delivery plan. Rejected unless the service is idle.
    StartPlan(Vec<StopRequest>),

    /// A passcode entered at the arrival prompt.
    SubmitPasscode(String),

    /// The occupant took their item; close up and move on.
    ConfirmPickup,

    /// The occupant found the wrong item behind the door. Requires a
    /// fresh passcode; on success every slot is opened for inspection.
    ReportMisrouted { passcode: String },

    /// The occupant wants the item carried back to base. Recorded and
    /// surfaced in the end-of-trip summary; the door stays open until
    /// a pickup is eventually confirmed.
    DeferToBase,

    /// Replace the stored passcode (old value must match).
    ChangePasscode { old: String, new: String },

    /// Abandon the current plan and unlock the controls.
    Reset,
}
