//! Delivery service — the hexagonal core.
//!
//! [`DeliveryService`] owns the mission context, door safety guard and
//! occupant notifier, and sequences the whole errand. All I/O flows
//! through port traits passed in at call sites, making the entire
//! workflow testable with mock collaborators.
//!
//! ```text
//!  AppCommand ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!  NavCompletion  │       DeliveryService        │
//!  tick()         │  Stage · Guard · Notifier    │──▶ NavigationPort
//!                 └──────────────────────────────┘──▶ DoorPort
//!                                                 └─▶ SignalPort
//! ```
//!
//! Stage transitions only ever happen inside `handle_command`,
//! `handle_nav_result` and `tick`, all called from the one control
//! loop thread — that is the serialization guarantee. Navigation
//! completions carry a token; anything tagged for an abandoned leg is
//! dropped before it can touch the stage.

use log::{debug, info, warn};

use crate::config::SystemConfig;
use crate::gate::AccessGate;
use crate::guard::{DoorSafetyGuard, VerifyPoll};
use crate::mission::Stage;
use crate::mission::context::MissionContext;
use crate::mission::plan::{DeliveryPlan, DoorSlot, PendingReturn, StopRequest};
use crate::notifier::Notifier;

use super::commands::AppCommand;
use super::events::{AppEvent, PlanRejection};
use super::ports::{
    DoorCommand, DoorPort, EventSink, NavCompletion, NavOutcome, NavRequest, NavigationPort,
    SignalPort, StoragePort,
};
use crate::error::DoorError;

/// The delivery orchestrator.
pub struct DeliveryService {
    config: SystemConfig,
    ctx: MissionContext,
    guard: DoorSafetyGuard,
    notifier: Notifier,
}

impl DeliveryService {
    pub fn new(config: SystemConfig) -> Self {
        let guard = DoorSafetyGuard::new(&config);
        let notifier = Notifier::new(config.secs_to_ticks(config.notify_interval_secs));
        Self {
            config,
            ctx: MissionContext::new(),
            guard,
            notifier,
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn stage(&self) -> Stage {
        self.ctx.stage
    }

    pub fn pending_returns(&self) -> &[PendingReturn] {
        &self.ctx.pending_returns
    }

    /// Whether the current stop was escalated to all-slots-open.
    pub fn escalated(&self) -> bool {
        self.ctx.escalated
    }

    pub fn notifier_active(&self) -> bool {
        self.notifier.is_active()
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (operator screen, remote console).
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        door: &mut impl DoorPort,
        store: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::StartPlan(requests) => self.start_plan(&requests, door, sink),
            AppCommand::SubmitPasscode(code) => self.submit_passcode(&code, door, store, sink),
            AppCommand::ConfirmPickup => self.confirm_pickup(door, sink),
            AppCommand::ReportMisrouted { passcode } => {
                self.report_misrouted(&passcode, door, store, sink);
            }
            AppCommand::DeferToBase => self.defer_to_base(sink),
            AppCommand::ChangePasscode { old, new } => {
                if AccessGate::change(store, &old, &new) {
                    sink.emit(&AppEvent::PasscodeChanged);
                } else {
                    sink.emit(&AppEvent::PasscodeChangeRejected);
                }
            }
            AppCommand::Reset => {
                info!("plan reset by operator");
                self.reset(sink);
            }
        }
    }

    /// Deliver one navigation completion. Called by `tick` for polled
    /// adapters; push-style adapters may call it directly from the
    /// control loop thread.
    pub fn handle_nav_result(
        &mut self,
        completion: NavCompletion,
        signal: &mut impl SignalPort,
        sink: &mut impl EventSink,
    ) {
        if completion.token != self.ctx.nav_token {
            warn!(
                "stale navigation completion (token {} != {}), ignoring",
                completion.token, self.ctx.nav_token
            );
            return;
        }

        match (self.ctx.stage, completion.outcome) {
            (Stage::EnRouteToStop(index), NavOutcome::Arrived) => {
                let Some(destination) = self.destination(index) else {
                    self.reset(sink);
                    return;
                };
                info!("arrived at '{destination}'");
                self.transition(Stage::ArrivedAwaitingAuth(index), sink);
                sink.emit(&AppEvent::Arrived {
                    destination: destination.clone(),
                });
                // Signal immediately, then repeat on the interval
                // until the passcode lands.
                self.notifier.start(&destination);
                signal.signal_once(&destination, self.config.signal_hold_ms);
            }
            (Stage::EnRouteToBase, NavOutcome::Arrived) => {
                self.complete(sink);
            }
            (Stage::EnRouteToStop(_) | Stage::EnRouteToBase, NavOutcome::Failed { code, message }) => {
                warn!("navigation failed (code {code}): {message}");
                sink.emit(&AppEvent::NavigationFailed { code, message });
                self.reset(sink);
            }
            (stage, outcome) => {
                warn!(
                    "navigation completion ignored in stage {}: {outcome:?}",
                    stage.name()
                );
            }
        }
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle: drain navigation completions, advance
    /// the pre-departure settle, drive the close-verify loop, fire the
    /// notifier.
    pub fn tick(
        &mut self,
        nav: &mut impl NavigationPort,
        door: &mut impl DoorPort,
        signal: &mut impl SignalPort,
        sink: &mut impl EventSink,
    ) {
        while let Some(completion) = nav.poll_completion() {
            self.handle_nav_result(completion, signal, sink);
        }

        if self.ctx.stage == Stage::PreDepartureCheck {
            self.tick_predeparture(nav, door, sink);
        }

        if let Stage::ClosingAndVerifying(index) = self.ctx.stage {
            match self.guard.poll(door) {
                VerifyPoll::Verified => self.advance_after_close(index, nav, sink),
                VerifyPoll::StillOpen { retries } => {
                    sink.emit(&AppEvent::DoorStillOpen { retries });
                }
                VerifyPoll::Waiting | VerifyPoll::Inactive => {}
            }
        }

        if let Some(destination) = self.notifier.poll() {
            let destination = destination.to_string();
            signal.signal_once(&destination, self.config.signal_hold_ms);
        }
    }

    // ── Stage handlers ────────────────────────────────────────

    fn start_plan(&mut self, requests: &[StopRequest], door: &mut impl DoorPort, sink: &mut impl EventSink) {
        if self.ctx.plan_active() {
            warn!("plan rejected: another plan is active");
            sink.emit(&AppEvent::PlanRejected(PlanRejection::PlanActive));
            return;
        }
        let plan = match DeliveryPlan::build(requests) {
            Ok(plan) => plan,
            Err(e) => {
                info!("plan rejected: {e}");
                sink.emit(&AppEvent::PlanRejected(PlanRejection::BadPlan(e)));
                return;
            }
        };

        sink.emit(&AppEvent::PlanStarted {
            stops: plan.stops().len(),
            merged: plan.is_merged(),
        });
        self.ctx.plan = Some(plan);

        // Shut everything before the safety check; the check decides
        // whether the close actually took.
        self.issue_door(door, DoorCommand::CloseAll, sink);
        self.ctx.predeparture_wait =
            Some(self.config.secs_to_ticks(self.config.predeparture_settle_secs));
        self.transition(Stage::PreDepartureCheck, sink);
    }

    fn tick_predeparture(
        &mut self,
        nav: &mut impl NavigationPort,
        door: &mut impl DoorPort,
        sink: &mut impl EventSink,
    ) {
        let Some(remaining) = self.ctx.predeparture_wait else {
            return;
        };
        if remaining > 1 {
            self.ctx.predeparture_wait = Some(remaining - 1);
            return;
        }
        self.ctx.predeparture_wait = None;

        if self.guard.check_all_closed(door) {
            self.depart_for_stop(0, nav, sink);
        } else {
            warn!("pre-departure check failed: doors not closed, aborting");
            sink.emit(&AppEvent::DepartureBlocked);
            self.reset(sink);
        }
    }

    fn submit_passcode(
        &mut self,
        code: &str,
        door: &mut impl DoorPort,
        store: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) {
        let Stage::ArrivedAwaitingAuth(index) = self.ctx.stage else {
            debug!("passcode ignored outside the auth prompt");
            return;
        };
        if !AccessGate::check(store, code) {
            info!("passcode rejected");
            sink.emit(&AppEvent::AuthRejected);
            return;
        }
        let Some(slot) = self.slot(index) else {
            self.reset(sink);
            return;
        };

        self.notifier.stop();
        sink.emit(&AppEvent::AuthAccepted);
        self.transition(Stage::DoorOpen(index), sink);
        self.issue_door(door, DoorCommand::open_for(slot), sink);
        self.transition(Stage::AwaitingPickupDecision(index), sink);
    }

    fn confirm_pickup(&mut self, door: &mut impl DoorPort, sink: &mut impl EventSink) {
        let Stage::AwaitingPickupDecision(index) = self.ctx.stage else {
            debug!("pickup confirmation ignored outside the decision prompt");
            return;
        };
        self.transition(Stage::ClosingAndVerifying(index), sink);
        self.guard.begin_close_verify(door);
    }

    fn report_misrouted(
        &mut self,
        passcode: &str,
        door: &mut impl DoorPort,
        store: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) {
        let Stage::AwaitingPickupDecision(_) = self.ctx.stage else {
            debug!("misrouted report ignored outside the decision prompt");
            return;
        };
        if !AccessGate::check(store, passcode) {
            info!("misrouted report rejected: bad passcode");
            sink.emit(&AppEvent::AuthRejected);
            return;
        }
        info!("misrouted item confirmed, opening all slots for inspection");
        self.ctx.escalated = true;
        self.issue_door(door, DoorCommand::OpenAll, sink);
        sink.emit(&AppEvent::MisroutedEscalated);
    }

    fn defer_to_base(&mut self, sink: &mut impl EventSink) {
        let Stage::AwaitingPickupDecision(index) = self.ctx.stage else {
            debug!("defer ignored outside the decision prompt");
            return;
        };
        let Some(stop) = self.ctx.plan.as_ref().and_then(|p| p.stop(index)) else {
            return;
        };
        let record = PendingReturn {
            destination: stop.destination.clone(),
            slot: stop.slot,
        };
        info!("pickup at '{}' deferred to base", record.destination);
        sink.emit(&AppEvent::PickupDeferred {
            destination: record.destination.clone(),
        });
        self.ctx.record_pending_return(record);
        // The door stays open and the stage holds: the same prompt
        // remains until a pickup is eventually confirmed.
    }

    fn advance_after_close(
        &mut self,
        index: usize,
        nav: &mut impl NavigationPort,
        sink: &mut impl EventSink,
    ) {
        let stop_info = self
            .ctx
            .plan
            .as_ref()
            .and_then(|p| p.stop(index).map(|s| (s.slot, p.has_next(index))));
        let Some((slot, has_next)) = stop_info else {
            self.reset(sink);
            return;
        };
        self.ctx.escalated = false;

        // A merged Both-slot visit serves both orders at once, so the
        // remaining stop list is already exhausted.
        if slot == DoorSlot::Both || !has_next {
            self.depart_for_base(nav, sink);
        } else {
            self.depart_for_stop(index + 1, nav, sink);
        }
    }

    fn complete(&mut self, sink: &mut impl EventSink) {
        let pending: Vec<PendingReturn> = self.ctx.pending_returns.iter().cloned().collect();
        if pending.is_empty() {
            info!("delivery complete");
        } else {
            info!(
                "delivery complete with {} deferred pickup(s) to reconcile",
                pending.len()
            );
        }
        self.transition(Stage::Completed, sink);
        sink.emit(&AppEvent::Completed {
            pending_returns: pending,
        });
        self.reset(sink);
    }

    // ── Internal ──────────────────────────────────────────────

    fn depart_for_stop(
        &mut self,
        index: usize,
        nav: &mut impl NavigationPort,
        sink: &mut impl EventSink,
    ) {
        let Some(destination) = self.destination(index) else {
            self.reset(sink);
            return;
        };
        let token = self.ctx.next_nav_token();
        let accepted = nav.start_navigation(NavRequest {
            site_id: self.config.site_id,
            destination: destination.clone(),
            speed_mps: self.config.nav_speed_mps,
            timeout_ms: self.config.nav_timeout_ms,
            token,
        });
        match accepted {
            Ok(()) => {
                info!("en route to '{destination}'");
                self.transition(Stage::EnRouteToStop(index), sink);
            }
            Err(e) => {
                warn!("navigation request refused: {e}");
                sink.emit(&AppEvent::NavigationFailed {
                    code: -1,
                    message: e.to_string(),
                });
                self.reset(sink);
            }
        }
    }

    fn depart_for_base(&mut self, nav: &mut impl NavigationPort, sink: &mut impl EventSink) {
        let destination = self.config.base_destination.clone();
        let token = self.ctx.next_nav_token();
        let accepted = nav.start_navigation(NavRequest {
            site_id: self.config.site_id,
            destination: destination.clone(),
            speed_mps: self.config.nav_speed_mps,
            timeout_ms: self.config.nav_timeout_ms,
            token,
        });
        match accepted {
            Ok(()) => {
                info!("returning to '{destination}'");
                self.transition(Stage::EnRouteToBase, sink);
            }
            Err(e) => {
                warn!("return navigation refused: {e}");
                sink.emit(&AppEvent::NavigationFailed {
                    code: -1,
                    message: e.to_string(),
                });
                self.reset(sink);
            }
        }
    }

    /// Stop the notifier, discard pending door re-checks, wipe the
    /// plan, unlock the controls.
    fn reset(&mut self, sink: &mut impl EventSink) {
        self.notifier.stop();
        self.guard.cancel();
        if self.ctx.plan_active() {
            self.transition(Stage::Idle, sink);
        }
        self.ctx.reset();
    }

    fn transition(&mut self, to: Stage, sink: &mut impl EventSink) {
        let from = self.ctx.stage;
        info!("stage transition: {} -> {}", from.name(), to.name());
        self.ctx.stage = to;
        sink.emit(&AppEvent::StageChanged { from, to });
    }

    fn issue_door(&mut self, door: &mut impl DoorPort, cmd: DoorCommand, sink: &mut impl EventSink) {
        if let Err(e) = door.command(cmd) {
            warn!("door command {cmd:?} failed: {e}");
            if e == DoorError::Blocked {
                sink.emit(&AppEvent::DoorBlocked);
            }
        }
    }

    fn destination(&self, index: usize) -> Option<String> {
        self.ctx
            .plan
            .as_ref()
            .and_then(|p| p.stop(index))
            .map(|s| s.destination.clone())
    }

    fn slot(&self, index: usize) -> Option<DoorSlot> {
        self.ctx
            .plan
            .as_ref()
            .and_then(|p| p.stop(index))
            .map(|s| s.slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memstore::MemStore;
    use crate::error::NavError;

    struct NullNav;
    impl NavigationPort for NullNav {
        fn start_navigation(&mut self, _req: NavRequest) -> Result<(), NavError> {
            Ok(())
        }
        fn go_to_charge(&mut self, _site_id: u32) {}
        fn stop_navigation(&mut self, _site_id: u32, _immediate: bool) {}
        fn poll_completion(&mut self) -> Option<NavCompletion> {
            None
        }
    }

    struct ClosedDoor;
    impl DoorPort for ClosedDoor {
        fn query_status(&mut self) -> Result<String, DoorError> {
            Ok(r#"{"door1":0,"door2":0,"door3":0,"door4":0}"#.to_string())
        }
        fn command(&mut self, _cmd: DoorCommand) -> Result<(), DoorError> {
            Ok(())
        }
    }

    struct NullSignal;
    impl SignalPort for NullSignal {
        fn signal_once(&mut self, _destination: &str, _hold_ms: u64) {}
    }

    struct NullSink;
    impl EventSink for NullSink {
        fn emit(&mut self, _event: &AppEvent) {}
    }

    fn one_stop() -> Vec<StopRequest> {
        vec![StopRequest {
            destination: "dock-a".to_string(),
            slot: DoorSlot::Upper,
        }]
    }

    #[test]
    fn fresh_service_is_idle() {
        let svc = DeliveryService::new(SystemConfig::default());
        assert_eq!(svc.stage(), Stage::Idle);
        assert!(!svc.notifier_active());
    }

    #[test]
    fn start_plan_enters_predeparture() {
        let mut svc = DeliveryService::new(SystemConfig::default());
        svc.handle_command(
            AppCommand::StartPlan(one_stop()),
            &mut ClosedDoor,
            &mut MemStore::new(),
            &mut NullSink,
        );
        assert_eq!(svc.stage(), Stage::PreDepartureCheck);
    }

    #[test]
    fn second_plan_rejected_while_active() {
        let mut svc = DeliveryService::new(SystemConfig::default());
        let mut store = MemStore::new();
        svc.handle_command(
            AppCommand::StartPlan(one_stop()),
            &mut ClosedDoor,
            &mut store,
            &mut NullSink,
        );
        svc.handle_command(
            AppCommand::StartPlan(one_stop()),
            &mut ClosedDoor,
            &mut store,
            &mut NullSink,
        );
        // The running plan is undisturbed.
        assert_eq!(svc.stage(), Stage::PreDepartureCheck);
    }

    #[test]
    fn commands_outside_their_stage_are_ignored() {
        let mut svc = DeliveryService::new(SystemConfig::default());
        let mut store = MemStore::new();
        svc.handle_command(
            AppCommand::ConfirmPickup,
            &mut ClosedDoor,
            &mut store,
            &mut NullSink,
        );
        svc.handle_command(
            AppCommand::SubmitPasscode("123456".to_string()),
            &mut ClosedDoor,
            &mut store,
            &mut NullSink,
        );
        svc.handle_command(
            AppCommand::DeferToBase,
            &mut ClosedDoor,
            &mut store,
            &mut NullSink,
        );
        assert_eq!(svc.stage(), Stage::Idle);
    }

    #[test]
    fn stale_nav_completion_is_dropped() {
        let mut svc = DeliveryService::new(SystemConfig::default());
        svc.handle_nav_result(
            NavCompletion {
                token: 99,
                outcome: NavOutcome::Arrived,
            },
            &mut NullSignal,
            &mut NullSink,
        );
        assert_eq!(svc.stage(), Stage::Idle);
    }
}
