//! In-memory key-value storage adapter.
//!
//! Implements both [`ConfigPort`] and [`StoragePort`]. Writes are
//! atomic per key (a `HashMap` insert), namespaces are flattened into
//! composite keys, and config blobs are validated before they are
//! accepted — the same contract a flash-backed store would honour, so
//! swapping one in later changes nothing above the port.

use std::cell::RefCell;
use std::collections::HashMap;

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::SystemConfig;

const CONFIG_NAMESPACE: &str = "porterbot";
const CONFIG_KEY: &str = "syscfg";

pub struct MemStore {
    store: RefCell<HashMap<String, Vec<u8>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            store: RefCell::new(HashMap::new()),
        }
    }

    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }
}

fn validate_config(cfg: &SystemConfig) -> Result<(), ConfigError> {
    if cfg.base_destination.is_empty() {
        return Err(ConfigError::ValidationFailed(
            "base_destination must not be empty",
        ));
    }
    if !(0.1..=3.0).contains(&cfg.nav_speed_mps) {
        return Err(ConfigError::ValidationFailed(
            "nav_speed_mps must be 0.1–3.0",
        ));
    }
    if !(10_000..=3_600_000).contains(&cfg.nav_timeout_ms) {
        return Err(ConfigError::ValidationFailed(
            "nav_timeout_ms must be 10s–1h",
        ));
    }
    if !(500..=30_000).contains(&cfg.connect_timeout_ms) {
        return Err(ConfigError::ValidationFailed(
            "connect_timeout_ms must be 500–30000",
        ));
    }
    if cfg.arm_settle_ms > 5_000 {
        return Err(ConfigError::ValidationFailed(
            "arm_settle_ms must be <= 5000",
        ));
    }
    if !(500..=30_000).contains(&cfg.signal_hold_ms) {
        return Err(ConfigError::ValidationFailed(
            "signal_hold_ms must be 500–30000",
        ));
    }
    if !(5..=600).contains(&cfg.notify_interval_secs) {
        return Err(ConfigError::ValidationFailed(
            "notify_interval_secs must be 5–600",
        ));
    }
    if u64::from(cfg.notify_interval_secs) * 1000 <= cfg.arm_settle_ms + cfg.signal_hold_ms {
        return Err(ConfigError::ValidationFailed(
            "notify_interval_secs must exceed one signal sequence",
        ));
    }
    if !(1..=120).contains(&cfg.door_settle_secs) {
        return Err(ConfigError::ValidationFailed(
            "door_settle_secs must be 1–120",
        ));
    }
    if !(1..=120).contains(&cfg.predeparture_settle_secs) {
        return Err(ConfigError::ValidationFailed(
            "predeparture_settle_secs must be 1–120",
        ));
    }
    if !(100..=5000).contains(&cfg.control_loop_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "control_loop_interval_ms must be 100–5000",
        ));
    }
    Ok(())
}

impl ConfigPort for MemStore {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
        if let Some(bytes) = self.store.borrow().get(&key) {
            let cfg: SystemConfig =
                postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
            info!("memstore: loaded config");
            Ok(cfg)
        } else {
            info!("memstore: no stored config, using defaults");
            Ok(SystemConfig::default())
        }
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        self.store.borrow_mut().insert(key, bytes);
        info!("memstore: config saved");
        Ok(())
    }
}

impl StoragePort for MemStore {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let composite = Self::composite_key(namespace, key);
        match self.store.borrow().get(&composite) {
            Some(data) => {
                if data.len() > buf.len() {
                    warn!("memstore: value for {composite} larger than read buffer");
                }
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                Ok(len)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let composite = Self::composite_key(namespace, key);
        self.store.borrow_mut().insert(composite, data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        let composite = Self::composite_key(namespace, key);
        self.store.borrow_mut().remove(&composite);
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        let composite = Self::composite_key(namespace, key);
        self.store.borrow().contains_key(&composite)
    }
}
