//! Battery telemetry correlation store.
//!
//! Battery reports arrive in their own messages, disjoint from position
//! fixes. The store keeps the most recent snapshot per device; the
//! decoder merges it into whichever position message follows for that
//! device. Reading leaves the entry in place, writing overwrites it
//! (last write wins), and entries never expire for the life of the
//! process.

use crate::core::position::DeviceId;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Battery level value meaning "not reported"
const LEVEL_NOT_REPORTED: u32 = 255;

/// Raw voltage value meaning "not reported"
const VOLTAGE_NOT_REPORTED: u32 = 65535;

/// Raw voltage unit is 10 mV
const VOLTAGE_SCALE: f64 = 0.01;

/// Most recent battery telemetry for one device
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatterySnapshot {
    /// Charge level 0–100, `None` when the device sent the sentinel
    pub level: Option<u8>,
    /// Battery voltage in volts, `None` when the device sent the sentinel
    pub voltage: Option<f64>,
    /// Timestamp of the report that produced this snapshot
    pub time: DateTime<Utc>,
}

impl BatterySnapshot {
    /// Build a snapshot from raw wire values, suppressing sentinels
    pub fn from_raw(level: u32, voltage: u32, time: DateTime<Utc>) -> Self {
        let level = if level == LEVEL_NOT_REPORTED {
            None
        } else {
            u8::try_from(level).ok()
        };
        let voltage = if voltage == VOLTAGE_NOT_REPORTED {
            None
        } else {
            Some(f64::from(voltage) * VOLTAGE_SCALE)
        };
        Self {
            level,
            voltage,
            time,
        }
    }
}

/// Shared last-battery-report table, keyed by device identity.
///
/// Owned by the process and passed by `Arc` to every connection handler;
/// the map lock gives per-key read-modify-write atomicity and concurrent
/// writers for the same device resolve to whichever lands last.
#[derive(Debug, Default)]
pub struct BatteryStore {
    entries: RwLock<HashMap<DeviceId, BatterySnapshot>>,
}

impl BatteryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or overwrite the snapshot for a device
    pub fn put(&self, device_id: DeviceId, snapshot: BatterySnapshot) {
        self.entries.write().insert(device_id, snapshot);
    }

    /// Most recent snapshot for a device; the entry stays in place
    pub fn get(&self, device_id: DeviceId) -> Option<BatterySnapshot> {
        self.entries.read().get(&device_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn report_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2016, 7, 18, 14, 42, 22).unwrap()
    }

    #[test]
    fn test_from_raw_scales_voltage() {
        let snapshot = BatterySnapshot::from_raw(6, 392, report_time());
        assert_eq!(snapshot.level, Some(6));
        assert_eq!(snapshot.voltage, Some(3.92));
    }

    #[test]
    fn test_from_raw_suppresses_sentinels() {
        let snapshot = BatterySnapshot::from_raw(255, 65535, report_time());
        assert_eq!(snapshot.level, None);
        assert_eq!(snapshot.voltage, None);

        let snapshot = BatterySnapshot::from_raw(255, 421, report_time());
        assert_eq!(snapshot.level, None);
        assert_eq!(snapshot.voltage, Some(4.21));
    }

    #[test]
    fn test_put_overwrites_and_get_leaves_in_place() {
        let store = BatteryStore::new();
        let id = DeviceId(7);
        assert_eq!(store.get(id), None);

        store.put(id, BatterySnapshot::from_raw(6, 392, report_time()));
        store.put(id, BatterySnapshot::from_raw(3, 362, report_time()));

        let snapshot = store.get(id).unwrap();
        assert_eq!(snapshot.level, Some(3));
        // Reading does not consume the entry
        assert_eq!(store.get(id), Some(snapshot));
    }
}
