//! Unified error types for the Porterbot workflow core.
//!
//! Follows the same discipline as the firmware it grew out of: a single
//! `Error` enum that every subsystem can convert into, keeping the
//! control loop's error handling uniform. All variants are `Copy` so
//! they can be cheaply threaded through the orchestrator without
//! allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level workflow error
// ---------------------------------------------------------------------------

/// Every fallible operation in the workflow core funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The navigation service refused or aborted a request.
    Nav(NavError),
    /// The door unit could not be queried or commanded.
    Door(DoorError),
    /// A buzzer device could not be reached or written.
    Device(DeviceError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nav(e) => write!(f, "navigation: {e}"),
            Self::Door(e) => write!(f, "door: {e}"),
            Self::Device(e) => write!(f, "device: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Navigation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavError {
    /// A navigation request is already in flight.
    Busy,
    /// The navigation service rejected the request outright.
    Rejected,
    /// The destination label is unknown to the site map.
    UnknownDestination,
}

impl fmt::Display for NavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "request already in flight"),
            Self::Rejected => write!(f, "request rejected"),
            Self::UnknownDestination => write!(f, "unknown destination"),
        }
    }
}

impl From<NavError> for Error {
    fn from(e: NavError) -> Self {
        Self::Nav(e)
    }
}

// ---------------------------------------------------------------------------
// Door unit errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorError {
    /// The status query failed or timed out.
    QueryFailed,
    /// The status payload did not decode to four door states.
    BadPayload,
    /// The unit reported a blocked or jammed leaf. Surfaced as a
    /// warning to the operator, never treated as fatal.
    Blocked,
    /// A door command was not accepted.
    CommandFailed,
}

impl fmt::Display for DoorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueryFailed => write!(f, "status query failed"),
            Self::BadPayload => write!(f, "status payload undecodable"),
            Self::Blocked => write!(f, "door blocked"),
            Self::CommandFailed => write!(f, "command failed"),
        }
    }
}

impl From<DoorError> for Error {
    fn from(e: DoorError) -> Self {
        Self::Door(e)
    }
}

// ---------------------------------------------------------------------------
// Buzzer device errors
// ---------------------------------------------------------------------------

/// Connectivity and protocol failures on a buzzer link. Both kinds
/// invalidate the connection: the next task starts from a clean
/// connect instead of reusing a suspect socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    /// TCP connect failed or exceeded the bounded timeout.
    ConnectFailed,
    /// A register write or its response failed mid-transaction.
    WriteFailed,
    /// The response did not echo the request (protocol violation).
    BadResponse,
    /// The worker is stopped and refuses new submissions.
    NotRunning,
    /// The task queue is full (signals are being dropped).
    QueueFull,
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed => write!(f, "connect failed"),
            Self::WriteFailed => write!(f, "register write failed"),
            Self::BadResponse => write!(f, "bad response"),
            Self::NotRunning => write!(f, "worker not running"),
            Self::QueueFull => write!(f, "task queue full"),
        }
    }
}

impl From<DeviceError> for Error {
    fn from(e: DeviceError) -> Self {
        Self::Device(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
