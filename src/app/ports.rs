//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ DeliveryService (domain)
//! ```
//!
//! Driven adapters (navigation service, door unit, buzzer bank, event
//! sinks, storage) implement these traits. The
//! [`DeliveryService`](super::service::DeliveryService) consumes them
//! via generics, so the workflow core never touches a robot SDK or a
//! socket directly.
//!
//! Navigation is asynchronous on the robot: requests return
//! immediately and the outcome arrives later. To keep every stage
//! transition on the control-loop thread, adapters buffer outcomes and
//! hand them over through [`NavigationPort::poll_completion`] — the
//! service polls once per tick.

use crate::config::SystemConfig;
use crate::error::{DoorError, NavError};
use crate::mission::plan::DoorSlot;

// ───────────────────────────────────────────────────────────────
// Navigation port (driven adapter: domain → navigation service)
// ───────────────────────────────────────────────────────────────

/// One navigation request. `token` tags the eventual completion so
/// results for an abandoned leg can be recognised and dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct NavRequest {
    pub site_id: u32,
    pub destination: String,
    pub speed_mps: f32,
    pub timeout_ms: u64,
    pub token: u32,
}

/// Terminal outcome of one navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOutcome {
    /// The robot reached the destination.
    Arrived,
    /// The navigation service gave up or errored.
    Failed { code: i32, message: String },
}

/// A finished navigation request, tagged with its request token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavCompletion {
    pub token: u32,
    pub outcome: NavOutcome,
}

/// The navigation collaborator.
pub trait NavigationPort {
    /// Begin navigating. Returns `Err` only when the request is not
    /// accepted at all; acceptance is not arrival.
    fn start_navigation(&mut self, req: NavRequest) -> Result<(), NavError>;

    /// Send the robot to its charging dock (fire-and-forget).
    fn go_to_charge(&mut self, site_id: u32);

    /// Cancel in-flight navigation. The workflow core itself never
    /// calls this mid-plan; it exists for host shutdown paths.
    fn stop_navigation(&mut self, site_id: u32, immediate: bool);

    /// Hand over the next buffered completion, if any.
    fn poll_completion(&mut self) -> Option<NavCompletion>;
}

// ───────────────────────────────────────────────────────────────
// Door port (driven adapter: domain → cabin door unit)
// ───────────────────────────────────────────────────────────────

/// Commands understood by the cabin door unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorCommand {
    OpenUpper,
    OpenLower,
    OpenAll,
    CloseAll,
}

impl DoorCommand {
    /// The open command for a stop's assigned slot.
    pub fn open_for(slot: DoorSlot) -> Self {
        match slot {
            DoorSlot::Upper => Self::OpenUpper,
            DoorSlot::Lower => Self::OpenLower,
            DoorSlot::Both => Self::OpenAll,
        }
    }
}

/// The door unit collaborator.
///
/// `query_status` returns the unit's raw JSON payload; the typed
/// decode (and the fail-closed classification of anything that does
/// not decode) lives in [`crate::guard`], at the domain side of the
/// boundary.
pub trait DoorPort {
    /// One status query. Bounded; fails fast rather than hanging.
    fn query_status(&mut self) -> Result<String, DoorError>;

    /// Issue a door command. `Err(DoorError::Blocked)` means the unit
    /// reported a jammed leaf — a warning condition, not a crash.
    fn command(&mut self, cmd: DoorCommand) -> Result<(), DoorError>;
}

// ───────────────────────────────────────────────────────────────
// Signal port (driven adapter: domain → buzzer bank)
// ───────────────────────────────────────────────────────────────

/// Fire-and-forget occupant signalling. Implementations route the
/// destination label to the right device and enqueue one signal
/// sequence on its worker; an unrouted label is a logged no-op.
pub trait SignalPort {
    fn signal_once(&mut self, destination: &str, hold_ms: u64);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / operator UI)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go (log lines, the
/// operator screen, a remote console).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped — a compromised provisioning channel must not
/// be able to inject dangerous operating parameters (e.g. a zero door
/// settle delay).
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ key-value store)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage for the passcode, config blob and
/// similar small records.
///
/// - Keys are namespaced to prevent collisions between subsystems.
/// - Writes are atomic per key — no partial values on power loss.
/// - The passcode deliberately lives here as an exact string (no
///   hashing, no lockout); the cabin lock is a convenience barrier,
///   not a security boundary.
pub trait StoragePort {
    /// Read a value. Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key. Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_command_follows_slot() {
        assert_eq!(DoorCommand::open_for(DoorSlot::Upper), DoorCommand::OpenUpper);
        assert_eq!(DoorCommand::open_for(DoorSlot::Lower), DoorCommand::OpenLower);
        assert_eq!(DoorCommand::open_for(DoorSlot::Both), DoorCommand::OpenAll);
    }
}
