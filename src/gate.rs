//! Passcode access gate.
//!
//! One shared secret guards cabin-door unlock. The stored value lives
//! in the `auth` namespace of the key-value store; before first
//! configuration a built-in default applies. Changing the passcode
//! requires proving the old one — a plain compare-and-swap, no
//! history, no accounts.

use log::{info, warn};

use crate::app::ports::StoragePort;

const AUTH_NAMESPACE: &str = "auth";
const PASSCODE_KEY: &str = "passcode";
const DEFAULT_PASSCODE: &str = "123456";

/// Longest accepted passcode, in bytes.
const MAX_PASSCODE_LEN: usize = 64;

/// Passcode check / change over a [`StoragePort`].
pub struct AccessGate;

impl AccessGate {
    /// Exact-string comparison against the stored passcode.
    /// Falls back to the factory default when none is stored.
    pub fn check(store: &impl StoragePort, candidate: &str) -> bool {
        let mut buf = [0u8; MAX_PASSCODE_LEN];
        let stored = match store.read(AUTH_NAMESPACE, PASSCODE_KEY, &mut buf) {
            Ok(len) => core::str::from_utf8(&buf[..len]).unwrap_or(DEFAULT_PASSCODE),
            Err(_) => DEFAULT_PASSCODE,
        };
        stored == candidate
    }

    /// Replace the passcode. Succeeds only when `old` matches the
    /// current value; the stored value is untouched otherwise.
    pub fn change(store: &mut impl StoragePort, old: &str, new: &str) -> bool {
        if !Self::check(store, old) {
            info!("passcode change rejected: old passcode mismatch");
            return false;
        }
        if new.is_empty() || new.len() > MAX_PASSCODE_LEN {
            info!("passcode change rejected: bad length");
            return false;
        }
        match store.write(AUTH_NAMESPACE, PASSCODE_KEY, new.as_bytes()) {
            Ok(()) => {
                info!("passcode changed");
                true
            }
            Err(e) => {
                warn!("passcode change failed to persist: {e}");
                false
            }
        }
    }
}
