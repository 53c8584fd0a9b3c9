//! Shared mutable context for a running mission.
//!
//! `MissionContext` is the blackboard the service reads from and
//! writes to while a plan runs: the plan itself, deferred-pickup
//! records, the stale-callback token and the pre-departure countdown.
//! Everything here is per-plan state and is wiped by [`reset`].
//!
//! [`reset`]: MissionContext::reset

use heapless::Vec;
use log::warn;

use super::Stage;
use super::plan::{DeliveryPlan, PendingReturn, MAX_PENDING_RETURNS};

/// Per-plan mutable state owned by the delivery service.
pub struct MissionContext {
    /// Current stage. Single live value; transitions are serialized.
    pub stage: Stage,
    /// The active plan, `None` while idle.
    pub plan: Option<DeliveryPlan>,
    /// Deferred pickups collected during this plan.
    pub pending_returns: Vec<PendingReturn, MAX_PENDING_RETURNS>,
    /// Token carried by the in-flight navigation request. Completions
    /// bearing any other token belong to an abandoned leg and are
    /// dropped.
    pub nav_token: u32,
    /// Ticks remaining before the pre-departure safety check fires.
    pub predeparture_wait: Option<u32>,
    /// Whether the current stop was escalated to all-slots-open after
    /// a misrouted-item report.
    pub escalated: bool,
}

impl MissionContext {
    pub fn new() -> Self {
        Self {
            stage: Stage::Idle,
            plan: None,
            pending_returns: Vec::new(),
            nav_token: 0,
            predeparture_wait: None,
            escalated: false,
        }
    }

    /// True while any plan is active (the single-active-plan check).
    pub fn plan_active(&self) -> bool {
        !matches!(self.stage, Stage::Idle)
    }

    /// Issue a fresh navigation token, invalidating any completion
    /// still in flight for a previous request.
    pub fn next_nav_token(&mut self) -> u32 {
        self.nav_token = self.nav_token.wrapping_add(1);
        self.nav_token
    }

    /// Record a deferred pickup. Capacity-bounded; an overflowing
    /// record is logged and dropped rather than corrupting the plan.
    pub fn record_pending_return(&mut self, record: PendingReturn) {
        if let Err(rejected) = self.pending_returns.push(record) {
            warn!(
                "pending-return list full, dropping record for '{}'",
                rejected.destination
            );
        }
    }

    /// Drop all per-plan state and return to `Idle`. The nav token is
    /// deliberately not rewound so stale completions stay stale.
    pub fn reset(&mut self) {
        self.stage = Stage::Idle;
        self.plan = None;
        self.pending_returns.clear();
        self.predeparture_wait = None;
        self.escalated = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission::plan::{DoorSlot, StopRequest};

    #[test]
    fn fresh_context_is_idle() {
        let ctx = MissionContext::new();
        assert_eq!(ctx.stage, Stage::Idle);
        assert!(!ctx.plan_active());
        assert!(ctx.pending_returns.is_empty());
    }

    #[test]
    fn nav_tokens_are_monotonic() {
        let mut ctx = MissionContext::new();
        let a = ctx.next_nav_token();
        let b = ctx.next_nav_token();
        assert_ne!(a, b);
        assert_eq!(ctx.nav_token, b);
    }

    #[test]
    fn reset_clears_plan_state_but_not_token() {
        let mut ctx = MissionContext::new();
        ctx.stage = Stage::EnRouteToBase;
        ctx.plan = Some(
            DeliveryPlan::build(&[StopRequest {
                destination: "dock-a".to_string(),
                slot: DoorSlot::Upper,
            }])
            .unwrap(),
        );
        ctx.record_pending_return(PendingReturn {
            destination: "dock-a".to_string(),
            slot: DoorSlot::Upper,
        });
        let token = ctx.next_nav_token();

        ctx.reset();
        assert_eq!(ctx.stage, Stage::Idle);
        assert!(ctx.plan.is_none());
        assert!(ctx.pending_returns.is_empty());
        assert_eq!(ctx.nav_token, token);
    }

    #[test]
    fn pending_return_overflow_is_dropped_not_panicking() {
        let mut ctx = MissionContext::new();
        for i in 0..(MAX_PENDING_RETURNS + 3) {
            ctx.record_pending_return(PendingReturn {
                destination: format!("dock-{i}"),
                slot: DoorSlot::Lower,
            });
        }
        assert_eq!(ctx.pending_returns.len(), MAX_PENDING_RETURNS);
    }
}
