//! System configuration parameters
//!
//! All tunable parameters for the Porterbot delivery workflow.
//! Values can be overridden via the key-value store or an operator
//! provisioning surface; the defaults are the constants observed in
//! commissioning.

use serde::{Deserialize, Serialize};

/// Maps a destination label fragment to the buzzer that serves it.
///
/// A stop whose destination name *contains* `label_match` signals the
/// buzzer at `host`. Stops with no matching route simply have no
/// occupant buzzer (the notifier becomes a no-op for them).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuzzerRoute {
    pub label_match: String,
    pub host: String,
}

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Navigation ---
    /// Site identifier passed to every navigation call
    pub site_id: u32,
    /// Destination label of the base / standby point
    pub base_destination: String,
    /// Cruise speed handed to the navigation service (m/s)
    pub nav_speed_mps: f32,
    /// Per-leg navigation timeout (milliseconds)
    pub nav_timeout_ms: u64,

    // --- Buzzer transport ---
    /// Destination-to-buzzer routing table
    pub buzzer_routes: Vec<BuzzerRoute>,
    /// Modbus/TCP port on the buzzer devices
    pub buzzer_port: u16,
    /// Modbus unit (slave) identifier
    pub buzzer_unit_id: u8,
    /// TCP connect timeout (milliseconds)
    pub connect_timeout_ms: u64,
    /// Delay between the arm write and the trigger write (milliseconds)
    pub arm_settle_ms: u64,
    /// How long the trigger register stays asserted per signal (milliseconds)
    pub signal_hold_ms: u64,

    // --- Notifier ---
    /// Interval between occupant signals while awaiting acknowledgement (seconds)
    pub notify_interval_secs: u32,

    // --- Door safety ---
    /// Settle delay before re-querying door state after a close command (seconds)
    pub door_settle_secs: u32,
    /// Settle delay between the pre-departure close and the safety check (seconds)
    pub predeparture_settle_secs: u32,

    // --- Timing ---
    /// Control loop interval (milliseconds)
    pub control_loop_interval_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Navigation
            site_id: 0,
            base_destination: "standby".to_string(),
            nav_speed_mps: 1.5,
            nav_timeout_ms: 600_000, // 10 min per leg
            // Buzzer transport
            buzzer_routes: vec![
                BuzzerRoute {
                    label_match: "dock-a".to_string(),
                    host: "192.168.162.101".to_string(),
                },
                BuzzerRoute {
                    label_match: "dock-b".to_string(),
                    host: "192.168.162.102".to_string(),
                },
            ],
            buzzer_port: 502,
            buzzer_unit_id: 1,
            connect_timeout_ms: 3000,
            arm_settle_ms: 200,
            signal_hold_ms: 6000,
            // Notifier
            notify_interval_secs: 30,
            // Door safety
            door_settle_secs: 5,
            predeparture_settle_secs: 3,
            // Timing
            control_loop_interval_ms: 500, // 2 Hz
        }
    }
}

impl SystemConfig {
    /// Convert a whole-second delay into control-loop ticks (rounded up,
    /// never zero so a countdown always spans at least one tick).
    pub fn secs_to_ticks(&self, secs: u32) -> u32 {
        let ms = u64::from(secs) * 1000;
        let interval = u64::from(self.control_loop_interval_ms.max(1));
        (ms.div_ceil(interval)).max(1) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = SystemConfig::default();
        assert!(c.nav_speed_mps > 0.0);
        assert!(c.nav_timeout_ms > 0);
        assert!(c.connect_timeout_ms > 0);
        assert!(c.signal_hold_ms > c.arm_settle_ms);
        assert!(u64::from(c.notify_interval_secs) * 1000 > c.signal_hold_ms);
        assert!(c.door_settle_secs > 0);
        assert!(c.control_loop_interval_ms > 0);
    }

    #[test]
    fn serde_roundtrip() {
        let c = SystemConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: SystemConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c.base_destination, c2.base_destination);
        assert_eq!(c.buzzer_routes, c2.buzzer_routes);
        assert_eq!(c.signal_hold_ms, c2.signal_hold_ms);
    }

    #[test]
    fn notify_interval_covers_signal_duration() {
        let c = SystemConfig::default();
        // The repeat interval must leave margin over one full signal
        // sequence (arm settle + hold), otherwise signals overlap.
        let sequence_ms = c.arm_settle_ms + c.signal_hold_ms;
        assert!(
            u64::from(c.notify_interval_secs) * 1000 > 2 * sequence_ms,
            "notify interval too short for the signal sequence"
        );
    }

    #[test]
    fn secs_to_ticks_rounds_up_and_is_nonzero() {
        let c = SystemConfig {
            control_loop_interval_ms: 500,
            ..Default::default()
        };
        assert_eq!(c.secs_to_ticks(5), 10);
        assert_eq!(c.secs_to_ticks(3), 6);
        assert_eq!(c.secs_to_ticks(0), 1);

        let coarse = SystemConfig {
            control_loop_interval_ms: 2000,
            ..Default::default()
        };
        assert_eq!(coarse.secs_to_ticks(5), 3);
    }

    #[test]
    fn postcard_roundtrip() {
        let c = SystemConfig::default();
        let bytes = postcard::to_allocvec(&c).unwrap();
        let c2: SystemConfig = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(c.buzzer_port, c2.buzzer_port);
        assert_eq!(c.notify_interval_secs, c2.notify_interval_secs);
    }
}
