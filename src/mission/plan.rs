//! Delivery plan construction.
//!
//! A plan is at most two stops, fixed once the mission starts. When
//! both requested stops name the same destination they are merged into
//! a single visit that opens both cabin slots, so the robot never
//! drives to the same door twice.

use heapless::Vec;
use log::info;
use serde::{Deserialize, Serialize};

/// Maximum stops per plan. The cabin has two slots, so two stops.
pub const MAX_STOPS: usize = 2;

/// Upper bound on deferred-pickup records per plan.
pub const MAX_PENDING_RETURNS: usize = 8;

/// Which cabin slot a stop unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoorSlot {
    Upper,
    Lower,
    Both,
}

/// Operator input: one requested destination with its assigned slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopRequest {
    pub destination: String,
    pub slot: DoorSlot,
}

/// A stop in a running plan. Immutable once the plan starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stop {
    pub destination: String,
    pub slot: DoorSlot,
}

/// A deferred pickup, surfaced to the operator when the trip ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReturn {
    pub destination: String,
    pub slot: DoorSlot,
}

/// Why a plan could not be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanError {
    /// No destinations were selected.
    Empty,
    /// More stops than the cabin has slots.
    TooManyStops,
}

impl core::fmt::Display for PlanError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Empty => write!(f, "no destination selected"),
            Self::TooManyStops => write!(f, "at most {MAX_STOPS} stops"),
        }
    }
}

/// An immutable, validated delivery plan.
#[derive(Debug, Clone)]
pub struct DeliveryPlan {
    stops: Vec<Stop, MAX_STOPS>,
    merged: bool,
}

impl DeliveryPlan {
    /// Validate and build a plan from operator input.
    ///
    /// Two stops naming the same destination collapse into one
    /// `Both`-slot stop; the second individual visit is skipped.
    pub fn build(requests: &[StopRequest]) -> Result<Self, PlanError> {
        if requests.is_empty() {
            return Err(PlanError::Empty);
        }
        if requests.len() > MAX_STOPS {
            return Err(PlanError::TooManyStops);
        }

        let mut stops: Vec<Stop, MAX_STOPS> = Vec::new();
        let mut merged = false;

        if requests.len() == 2 && requests[0].destination == requests[1].destination {
            info!(
                "plan: both stops target '{}', merging into one Both-slot visit",
                requests[0].destination
            );
            let _ = stops.push(Stop {
                destination: requests[0].destination.clone(),
                slot: DoorSlot::Both,
            });
            merged = true;
        } else {
            for req in requests {
                let _ = stops.push(Stop {
                    destination: req.destination.clone(),
                    slot: req.slot,
                });
            }
        }

        Ok(Self { stops, merged })
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn stop(&self, index: usize) -> Option<&Stop> {
        self.stops.get(index)
    }

    /// True when two same-destination requests were folded together.
    pub fn is_merged(&self) -> bool {
        self.merged
    }

    /// Whether another stop follows `index` in this plan.
    pub fn has_next(&self, index: usize) -> bool {
        index + 1 < self.stops.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(dest: &str, slot: DoorSlot) -> StopRequest {
        StopRequest {
            destination: dest.to_string(),
            slot,
        }
    }

    #[test]
    fn empty_plan_rejected() {
        assert!(matches!(DeliveryPlan::build(&[]), Err(PlanError::Empty)));
    }

    #[test]
    fn too_many_stops_rejected() {
        let reqs = [
            req("a", DoorSlot::Upper),
            req("b", DoorSlot::Lower),
            req("c", DoorSlot::Upper),
        ];
        assert!(matches!(
            DeliveryPlan::build(&reqs),
            Err(PlanError::TooManyStops)
        ));
    }

    #[test]
    fn single_stop_keeps_slot() {
        let plan = DeliveryPlan::build(&[req("dock-a", DoorSlot::Lower)]).unwrap();
        assert_eq!(plan.stops().len(), 1);
        assert_eq!(plan.stop(0).unwrap().slot, DoorSlot::Lower);
        assert!(!plan.is_merged());
    }

    #[test]
    fn two_distinct_stops_preserved_in_order() {
        let plan = DeliveryPlan::build(&[
            req("dock-a", DoorSlot::Upper),
            req("dock-b", DoorSlot::Lower),
        ])
        .unwrap();
        assert_eq!(plan.stops().len(), 2);
        assert_eq!(plan.stop(0).unwrap().destination, "dock-a");
        assert_eq!(plan.stop(1).unwrap().destination, "dock-b");
        assert!(plan.has_next(0));
        assert!(!plan.has_next(1));
    }

    #[test]
    fn same_destination_merges_to_both() {
        let plan = DeliveryPlan::build(&[
            req("dock-a", DoorSlot::Upper),
            req("dock-a", DoorSlot::Lower),
        ])
        .unwrap();
        assert_eq!(plan.stops().len(), 1);
        assert_eq!(plan.stop(0).unwrap().slot, DoorSlot::Both);
        assert!(plan.is_merged());
        assert!(!plan.has_next(0));
    }
}
