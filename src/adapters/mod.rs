//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements              | Connects to               |
//! |------------|-------------------------|---------------------------|
//! | `memstore` | ConfigPort, StoragePort | In-memory key-value store |
//! | `log_sink` | EventSink               | Log output                |
//! | `sim`      | NavigationPort          | Scripted site simulation  |
//! |            | DoorPort                | Scripted door unit        |
//!
//! The buzzer transport adapter lives with the rest of the device
//! plumbing in [`crate::device`] (`TcpRegisterLink` + `BuzzerBank`).
//! Robot-SDK-backed navigation and door adapters are provided by the
//! hosting application; the simulators here are what the binary and
//! the integration tests run against.

pub mod log_sink;
pub mod memstore;
pub mod sim;
