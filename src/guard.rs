//! Door safety guard.
//!
//! Two duties, both fail-closed:
//!
//! 1. **Pre-move check** — one status query; the robot may move only
//!    when the query succeeds, the payload decodes, and every door
//!    leaf reports closed. A timeout, an undecodable payload, an
//!    unknown state code, or any leaf open or still running all
//!    classify as unsafe. Ambiguity is never safe.
//! 2. **Close-then-verify loop** — after a pickup, issue close-all,
//!    wait out a settle delay, re-query. Not closed: reissue the
//!    close, re-arm the delay, report `StillOpen` so the caller can
//!    warn a human, and try again. Unbounded — this loop never gives
//!    up silently.
//!
//! The loop is tick-counted by the control loop, so cancelling a plan
//! discards any pending re-check with no timer to race against.

use log::{info, warn};
use serde::Deserialize;

use crate::app::ports::{DoorCommand, DoorPort};
use crate::config::SystemConfig;

// ---------------------------------------------------------------------------
// Door status decode (typed boundary for the unit's JSON payload)
// ---------------------------------------------------------------------------

/// Wire codes reported by the door unit, one per leaf.
const CODE_CLOSED: u8 = 0;
const CODE_OPEN: u8 = 1;
const CODE_RUNNING: u8 = 2;

/// State of one door leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorLeafState {
    Closed,
    Open,
    Running,
}

impl DoorLeafState {
    fn from_code(code: u8) -> Option<Self> {
        match code {
            CODE_CLOSED => Some(Self::Closed),
            CODE_OPEN => Some(Self::Open),
            CODE_RUNNING => Some(Self::Running),
            _ => None,
        }
    }
}

/// Raw JSON shape sent by the unit. Codes are validated separately so
/// an unknown value classifies as unsafe instead of failing decode
/// with a less specific error.
#[derive(Debug, Deserialize)]
struct RawDoorStatus {
    door1: u8,
    door2: u8,
    door3: u8,
    door4: u8,
}

/// A decoded point-in-time snapshot of all four door leaves.
/// Transient: recomputed on every query, never cached across a
/// decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorSnapshot {
    pub door1: DoorLeafState,
    pub door2: DoorLeafState,
    pub door3: DoorLeafState,
    pub door4: DoorLeafState,
}

impl DoorSnapshot {
    /// Decode the unit's JSON payload. `None` for anything that is not
    /// four known state codes — the caller treats that as unsafe.
    pub fn decode(payload: &str) -> Option<Self> {
        let raw: RawDoorStatus = serde_json::from_str(payload).ok()?;
        Some(Self {
            door1: DoorLeafState::from_code(raw.door1)?,
            door2: DoorLeafState::from_code(raw.door2)?,
            door3: DoorLeafState::from_code(raw.door3)?,
            door4: DoorLeafState::from_code(raw.door4)?,
        })
    }

    /// True only when every leaf reports fully closed.
    pub fn all_closed(&self) -> bool {
        [self.door1, self.door2, self.door3, self.door4]
            .iter()
            .all(|s| *s == DoorLeafState::Closed)
    }
}

// ---------------------------------------------------------------------------
// Guard
// ---------------------------------------------------------------------------

/// Result of polling the close-verify loop for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyPoll {
    /// No verify loop is running.
    Inactive,
    /// Settle delay still counting down.
    Waiting,
    /// All doors verified closed; the loop has ended.
    Verified,
    /// Re-check found a door not closed; close reissued, delay
    /// re-armed. `retries` counts re-checks so far for the warning.
    StillOpen { retries: u32 },
}

/// Queries door state and drives the close-then-verify retry loop.
pub struct DoorSafetyGuard {
    settle_ticks: u32,
    countdown: Option<u32>,
    retries: u32,
}

impl DoorSafetyGuard {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            settle_ticks: config.secs_to_ticks(config.door_settle_secs),
            countdown: None,
            retries: 0,
        }
    }

    /// One-shot safety classification: a single query, fail-closed.
    pub fn check_all_closed(&self, door: &mut impl DoorPort) -> bool {
        match door.query_status() {
            Ok(payload) => match DoorSnapshot::decode(&payload) {
                Some(snapshot) => snapshot.all_closed(),
                None => {
                    warn!("guard: undecodable door status, classifying unsafe");
                    false
                }
            },
            Err(e) => {
                warn!("guard: door status query failed ({e}), classifying unsafe");
                false
            }
        }
    }

    /// Issue close-all and arm the settle countdown. A refused close
    /// command is logged; the verify pass will catch the still-open
    /// door and reissue.
    pub fn begin_close_verify(&mut self, door: &mut impl DoorPort) {
        if let Err(e) = door.command(DoorCommand::CloseAll) {
            warn!("guard: close command refused ({e})");
        }
        self.retries = 0;
        self.countdown = Some(self.settle_ticks);
        info!(
            "guard: close issued, verifying in {} ticks",
            self.settle_ticks
        );
    }

    /// Abandon a running verify loop (plan reset).
    pub fn cancel(&mut self) {
        if self.countdown.take().is_some() {
            info!("guard: verify loop cancelled");
        }
        self.retries = 0;
    }

    pub fn is_active(&self) -> bool {
        self.countdown.is_some()
    }

    /// Advance one control tick.
    pub fn poll(&mut self, door: &mut impl DoorPort) -> VerifyPoll {
        let Some(remaining) = self.countdown else {
            return VerifyPoll::Inactive;
        };

        if remaining > 1 {
            self.countdown = Some(remaining - 1);
            return VerifyPoll::Waiting;
        }

        // Settle delay elapsed — re-query.
        if self.check_all_closed(door) {
            info!("guard: all doors verified closed after {} retries", self.retries);
            self.countdown = None;
            self.retries = 0;
            return VerifyPoll::Verified;
        }

        self.retries += 1;
        warn!(
            "guard: doors not closed (check #{}) — reissuing close",
            self.retries
        );
        if let Err(e) = door.command(DoorCommand::CloseAll) {
            warn!("guard: close command refused ({e})");
        }
        self.countdown = Some(self.settle_ticks);
        VerifyPoll::StillOpen {
            retries: self.retries,
        }
    }
}
