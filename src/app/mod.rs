//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the business rules for the Porterbot delivery
//! workflow: stage orchestration, door-safety gating, passcode
//! checking and occupant notification. All interaction with the robot
//! platform happens through **port traits** defined in [`ports`],
//! keeping this layer fully testable without a robot.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
