//! Mission stage machine types.
//!
//! The delivery workflow is a linear stage sequence with two loops
//! hanging off it (passcode retry and close-verify retry):
//!
//! ```text
//!  IDLE ──▶ PRE-DEPARTURE CHECK ──[unsafe]──▶ IDLE
//!                │ [all closed]
//!                ▼
//!  ┌──▶ EN ROUTE TO STOP(i)
//!  │             │ [arrived]
//!  │             ▼
//!  │    ARRIVED, AWAITING AUTH(i) ◀──[wrong passcode]──┐
//!  │             │ [passcode ok]                       │
//!  │             ▼                                     │
//!  │    DOOR OPEN(i) ──▶ AWAITING PICKUP DECISION(i) ──┘
//!  │             │ [confirmed]      ▲  [misrouted / defer]
//!  │             ▼                  │
//!  │    CLOSING AND VERIFYING(i) ───┘ (still open: reissue + warn)
//!  │             │ [verified closed]
//!  └──[next stop]┴──[last or merged stop]──▶ EN ROUTE TO BASE
//!                                                │ [arrived]
//!                                                ▼
//!                                            COMPLETED ──▶ IDLE
//! ```
//!
//! Transitions are driven by user commands, navigation completions and
//! control-loop ticks — never from more than one thread. The service
//! in [`crate::app::service`] owns the single live `Stage` value.

pub mod context;
pub mod plan;

/// The orchestrator's stage. Stop indices are zero-based positions in
/// the active [`plan::DeliveryPlan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// No plan active; controls unlocked.
    Idle,
    /// Doors commanded shut; waiting out the settle delay before the
    /// one-shot safety check.
    PreDepartureCheck,
    /// Navigation to stop `i` in flight.
    EnRouteToStop(usize),
    /// At stop `i`; buzzer loop running; waiting for a passcode.
    ArrivedAwaitingAuth(usize),
    /// Passcode accepted; door-open command issued for stop `i`.
    DoorOpen(usize),
    /// Door open at stop `i`; waiting for the occupant's decision.
    AwaitingPickupDecision(usize),
    /// Close commanded after pickup; verifying all doors report shut.
    ClosingAndVerifying(usize),
    /// Navigation back to the standby point in flight.
    EnRouteToBase,
    /// Terminal. Auto-resets to `Idle` after the summary is emitted.
    Completed,
}

impl Stage {
    /// Short name for transition logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::PreDepartureCheck => "PreDepartureCheck",
            Self::EnRouteToStop(_) => "EnRouteToStop",
            Self::ArrivedAwaitingAuth(_) => "ArrivedAwaitingAuth",
            Self::DoorOpen(_) => "DoorOpen",
            Self::AwaitingPickupDecision(_) => "AwaitingPickupDecision",
            Self::ClosingAndVerifying(_) => "ClosingAndVerifying",
            Self::EnRouteToBase => "EnRouteToBase",
            Self::Completed => "Completed",
        }
    }

    /// The stop index this stage is bound to, if any.
    pub fn stop_index(&self) -> Option<usize> {
        match self {
            Self::EnRouteToStop(i)
            | Self::ArrivedAwaitingAuth(i)
            | Self::DoorOpen(i)
            | Self::AwaitingPickupDecision(i)
            | Self::ClosingAndVerifying(i) => Some(*i),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_index_only_on_stop_bound_stages() {
        assert_eq!(Stage::Idle.stop_index(), None);
        assert_eq!(Stage::EnRouteToBase.stop_index(), None);
        assert_eq!(Stage::Completed.stop_index(), None);
        assert_eq!(Stage::EnRouteToStop(1).stop_index(), Some(1));
        assert_eq!(Stage::AwaitingPickupDecision(0).stop_index(), Some(0));
    }

    #[test]
    fn names_are_stable() {
        assert_eq!(Stage::ArrivedAwaitingAuth(0).name(), "ArrivedAwaitingAuth");
        assert_eq!(Stage::ClosingAndVerifying(1).name(), "ClosingAndVerifying");
    }
}
