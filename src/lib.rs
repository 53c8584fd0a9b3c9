//! Porterbot delivery workflow library.
//!
//! Exposes the pure-logic modules for integration testing and for the
//! hosting application. The robot platform (navigation service, door
//! unit, screen) is reached only through the port traits in
//! [`app::ports`]; everything in here runs and tests on a plain host.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod gate;
pub mod guard;
pub mod mission;
pub mod notifier;

pub mod adapters;
pub mod device;

mod error;

pub use error::{DeviceError, DoorError, Error, NavError};
