//! Buzzer device plumbing.
//!
//! Each remote buzzer is a tiny Modbus/TCP slave with two holding
//! registers of interest: `armed` must be set before the device will
//! accept a trigger, and `forced` is the actual on/off line. One
//! [`worker::BuzzerWorker`] owns all I/O to one device; nothing else
//! in the process touches its connection.

pub mod modbus;
pub mod worker;

use crate::error::DeviceError;

/// "Armed" holding register — write 1 to unlock the trigger.
pub const REG_ARMED: u16 = 0;

/// "Forced" holding register — 1 asserts the buzzer, 0 releases it.
pub const REG_FORCED: u16 = 1;

/// Delays applied inside one signal sequence.
#[derive(Debug, Clone, Copy)]
pub struct SignalTiming {
    /// Pause between the arm write and the trigger write.
    pub arm_settle_ms: u64,
}

/// Exclusive register transport for one device.
///
/// Connection lifecycle is fail-fast: `write_register` reconnects
/// lazily when no connection exists, and any I/O or protocol failure
/// discards the connection so the next operation starts from a clean
/// connect instead of reusing a suspect socket. There is no automatic
/// retry inside a call.
pub trait RegisterLink {
    /// Identifies the device in log lines (host:port).
    fn label(&self) -> &str;

    /// Establish the connection if none exists. Bounded; fails fast.
    fn ensure_connected(&mut self) -> Result<(), DeviceError>;

    /// Write one holding register, reconnecting first if needed.
    fn write_register(&mut self, address: u16, value: u16) -> Result<(), DeviceError>;

    /// Tear the connection down quietly.
    fn disconnect(&mut self);
}
