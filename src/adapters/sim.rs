//! Deterministic site simulation.
//!
//! Host-side stand-ins for the robot's navigation service and cabin
//! door unit: travel takes a fixed number of control ticks, doors open
//! and close instantly unless told to stick. The binary runs a whole
//! delivery against these; integration tests use them where scripting
//! a mock by hand would add nothing.

use std::collections::VecDeque;

use log::{debug, info};

use crate::app::ports::{DoorCommand, DoorPort, NavCompletion, NavOutcome, NavRequest, NavigationPort};
use crate::error::{DoorError, NavError};

// ───────────────────────────────────────────────────────────────
// Navigation simulator
// ───────────────────────────────────────────────────────────────

struct Leg {
    token: u32,
    destination: String,
    remaining_ticks: u32,
}

/// Simulated navigation: every accepted request arrives after a fixed
/// number of [`advance`](SimNavigation::advance) calls. Destinations
/// registered as failing produce a failure completion instead.
pub struct SimNavigation {
    travel_ticks: u32,
    in_flight: Option<Leg>,
    completed: VecDeque<NavCompletion>,
    failing: Vec<String>,
}

impl SimNavigation {
    pub fn new(travel_ticks: u32) -> Self {
        Self {
            travel_ticks: travel_ticks.max(1),
            in_flight: None,
            completed: VecDeque::new(),
            failing: Vec::new(),
        }
    }

    /// Make every leg to `destination` end in a navigation failure.
    pub fn fail_destination(&mut self, destination: &str) {
        self.failing.push(destination.to_string());
    }

    /// Advance simulated travel by one control tick.
    pub fn advance(&mut self) {
        let Some(mut leg) = self.in_flight.take() else {
            return;
        };
        leg.remaining_ticks -= 1;
        if leg.remaining_ticks > 0 {
            self.in_flight = Some(leg);
            return;
        }

        let outcome = if self.failing.contains(&leg.destination) {
            NavOutcome::Failed {
                code: -2,
                message: format!("simulated failure en route to '{}'", leg.destination),
            }
        } else {
            NavOutcome::Arrived
        };
        debug!("sim-nav: leg to '{}' finished: {outcome:?}", leg.destination);
        self.completed.push_back(NavCompletion {
            token: leg.token,
            outcome,
        });
    }
}

impl NavigationPort for SimNavigation {
    fn start_navigation(&mut self, req: NavRequest) -> Result<(), NavError> {
        if self.in_flight.is_some() {
            return Err(NavError::Busy);
        }
        info!("sim-nav: navigating to '{}'", req.destination);
        self.in_flight = Some(Leg {
            token: req.token,
            destination: req.destination,
            remaining_ticks: self.travel_ticks,
        });
        Ok(())
    }

    fn go_to_charge(&mut self, _site_id: u32) {
        info!("sim-nav: heading to the charging dock");
    }

    fn stop_navigation(&mut self, _site_id: u32, _immediate: bool) {
        if self.in_flight.take().is_some() {
            info!("sim-nav: navigation cancelled");
        }
    }

    fn poll_completion(&mut self) -> Option<NavCompletion> {
        self.completed.pop_front()
    }
}

// ───────────────────────────────────────────────────────────────
// Door unit simulator
// ───────────────────────────────────────────────────────────────

const LEAF_CLOSED: u8 = 0;
const LEAF_OPEN: u8 = 1;

/// Simulated cabin door unit: four leaves, JSON status payloads in
/// the real unit's shape. Leaves 1/2 are the upper slot, 3/4 the
/// lower. `stick_closes(n)` makes the next `n` close commands leave
/// one leaf open, for exercising the verify retry loop.
pub struct SimDoorUnit {
    leaves: [u8; 4],
    stubborn_closes: u32,
}

impl SimDoorUnit {
    pub fn new() -> Self {
        Self {
            leaves: [LEAF_CLOSED; 4],
            stubborn_closes: 0,
        }
    }

    /// Ignore the next `n` close commands (one leaf stays open).
    pub fn stick_closes(&mut self, n: u32) {
        self.stubborn_closes = n;
    }

    pub fn all_closed(&self) -> bool {
        self.leaves.iter().all(|s| *s == LEAF_CLOSED)
    }
}

impl DoorPort for SimDoorUnit {
    fn query_status(&mut self) -> Result<String, DoorError> {
        Ok(format!(
            r#"{{"door1":{},"door2":{},"door3":{},"door4":{}}}"#,
            self.leaves[0], self.leaves[1], self.leaves[2], self.leaves[3]
        ))
    }

    fn command(&mut self, cmd: DoorCommand) -> Result<(), DoorError> {
        match cmd {
            DoorCommand::OpenUpper => {
                self.leaves[0] = LEAF_OPEN;
                self.leaves[1] = LEAF_OPEN;
            }
            DoorCommand::OpenLower => {
                self.leaves[2] = LEAF_OPEN;
                self.leaves[3] = LEAF_OPEN;
            }
            DoorCommand::OpenAll => self.leaves = [LEAF_OPEN; 4],
            DoorCommand::CloseAll => {
                if self.stubborn_closes > 0 {
                    self.stubborn_closes -= 1;
                    // One leaf jams part-way; the rest shut.
                    self.leaves = [LEAF_CLOSED, LEAF_OPEN, LEAF_CLOSED, LEAF_CLOSED];
                } else {
                    self.leaves = [LEAF_CLOSED; 4];
                }
            }
        }
        debug!("sim-door: {cmd:?} -> {:?}", self.leaves);
        Ok(())
    }
}
