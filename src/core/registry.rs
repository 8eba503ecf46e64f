//! Device identity resolution and last-known-location lookup.
//!
//! Every inbound message leads with a wire-level identifier (a digit
//! string, typically the IMEI). The gateway resolves it to an internal
//! [`DeviceId`] before any record is emitted; messages from unresolvable
//! devices are discarded outright, never partially decoded.
//!
//! The registry is a seam: the daemon ships an in-memory implementation,
//! a deployment backed by a device database implements the same trait.

use crate::core::position::{DeviceId, Position};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Last known location fields copied into network-only reports.
///
/// Consumers must still honor `Position::valid` — these fields provide
/// continuity, not a fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LastLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub speed: f64,
    pub course: Option<f64>,
    pub altitude: Option<f64>,
}

/// Device/session registry
pub trait DeviceRegistry: Send + Sync {
    /// Resolve a wire-level identifier to an internal device handle.
    ///
    /// `None` means the message must be discarded.
    fn resolve(&self, unique_id: &str, remote: SocketAddr) -> Option<DeviceId>;

    /// Previously known location for a device, if any
    fn last_known(&self, device_id: DeviceId) -> Option<LastLocation>;

    /// Feed back an emitted position so later network-only reports can
    /// reuse its coordinates
    fn record_position(&self, position: &Position);
}

/// In-memory registry with optional auto-registration
pub struct MemoryRegistry {
    auto_register: bool,
    devices: RwLock<HashMap<String, DeviceId>>,
    last: RwLock<HashMap<DeviceId, LastLocation>>,
    next_id: AtomicU64,
}

impl MemoryRegistry {
    pub fn new(auto_register: bool) -> Self {
        Self {
            auto_register,
            devices: RwLock::new(HashMap::new()),
            last: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl DeviceRegistry for MemoryRegistry {
    fn resolve(&self, unique_id: &str, remote: SocketAddr) -> Option<DeviceId> {
        if let Some(id) = self.devices.read().get(unique_id) {
            return Some(*id);
        }
        if !self.auto_register {
            log::debug!("Unknown device {} from {}", unique_id, remote);
            return None;
        }
        let mut devices = self.devices.write();
        // Another handler may have registered it between the locks
        if let Some(id) = devices.get(unique_id) {
            return Some(*id);
        }
        let id = DeviceId(self.next_id.fetch_add(1, Ordering::Relaxed));
        devices.insert(unique_id.to_string(), id);
        log::info!("Registered device {} as {:?} (from {})", unique_id, id, remote);
        Some(id)
    }

    fn last_known(&self, device_id: DeviceId) -> Option<LastLocation> {
        self.last.read().get(&device_id).copied()
    }

    fn record_position(&self, position: &Position) {
        // Fallback state only tracks real fixes, so a network report can
        // never recycle another report's synthetic coordinates
        if !position.valid {
            return;
        }
        self.last.write().insert(
            position.device_id,
            LastLocation {
                latitude: position.latitude,
                longitude: position.longitude,
                speed: position.speed,
                course: position.course,
                altitude: position.altitude,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn remote() -> SocketAddr {
        "10.0.0.1:40000".parse().unwrap()
    }

    #[test]
    fn test_auto_register_assigns_stable_ids() {
        let registry = MemoryRegistry::new(true);
        let a = registry.resolve("864768010869060", remote()).unwrap();
        let b = registry.resolve("013632651491", remote()).unwrap();
        assert_ne!(a, b);
        assert_eq!(registry.resolve("864768010869060", remote()), Some(a));
    }

    #[test]
    fn test_unknown_device_without_auto_register() {
        let registry = MemoryRegistry::new(false);
        assert_eq!(registry.resolve("864768010869060", remote()), None);
    }

    #[test]
    fn test_record_position_skips_invalid_fixes() {
        let registry = MemoryRegistry::new(true);
        let id = registry.resolve("864768010869060", remote()).unwrap();
        let time = Utc.with_ymd_and_hms(2017, 1, 5, 15, 47, 45).unwrap();

        let mut position = Position::new("tk103", id, time);
        position.latitude = 51.597119;
        position.longitude = 0.019653;
        registry.record_position(&position);
        assert_eq!(registry.last_known(id), None);

        position.valid = true;
        position.speed = 2.5;
        registry.record_position(&position);
        let last = registry.last_known(id).unwrap();
        assert_eq!(last.latitude, 51.597119);
        assert_eq!(last.speed, 2.5);
    }
}
