//! Position records and their attribute model.
//!
//! Key types:
//! - [`Position`]: one observation of a device's state at a point in time
//! - [`AttributeValue`]: typed values for the open `attributes` map
//! - [`Network`]: raw cell-tower / Wi-Fi observations forwarded to an
//!   external geolocation resolver when the device had no satellite fix

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Internal device handle resolved from the wire-level identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DeviceId(pub u64);

/// Attribute keys used by this protocol family
pub mod keys {
    pub const ALARM: &str = "alarm";
    pub const IGNITION: &str = "ignition";
    pub const FUEL: &str = "fuel";
    pub const RSSI: &str = "rssi";
    pub const POWER: &str = "power";
    pub const BATTERY: &str = "battery";
}

/// Alarm attribute values emitted by the status code table
pub mod alarms {
    pub const MOVEMENT: &str = "movement";
    pub const LOW_BATTERY: &str = "lowBattery";
    pub const POWER_CUT: &str = "powerCut";
    pub const DISMOUNTING: &str = "dismounting";
    pub const SOS: &str = "sos";
    pub const OPENED: &str = "opened";
    pub const LOW_VOLTAGE: &str = "lowVoltage";
    pub const BAD_BATTERY: &str = "badBattery";
    pub const FUEL_CUT: &str = "fuelCut";
}

/// Typed attribute values
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

/// Cell tower observation (LBS)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellTower {
    pub mcc: u16,
    pub mnc: u16,
    pub lac: u32,
    pub cid: u64,
}

/// Wi-Fi access point observation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WifiAccessPoint {
    /// MAC address, `XX:XX:XX:XX:XX:XX`
    pub mac: String,
    /// Signal strength in dBm (negative in practice)
    pub rssi: i16,
    pub channel: u16,
}

/// Raw network observations attached when the device had no satellite fix
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Network {
    pub cell_towers: Vec<CellTower>,
    pub wifi_access_points: Vec<WifiAccessPoint>,
}

impl Network {
    pub fn is_empty(&self) -> bool {
        self.cell_towers.is_empty() && self.wifi_access_points.is_empty()
    }
}

/// One observation of a device's state at a point in time
///
/// Records are only built after the wire identifier resolved to a
/// [`DeviceId`]. `valid` is true only for real satellite fixes; network
/// reports carry fallback coordinates with `valid = false` and their own
/// report timestamp in `time`.
#[derive(Debug, Clone, Serialize)]
pub struct Position {
    pub device_id: DeviceId,
    pub protocol: &'static str,
    pub time: DateTime<Utc>,
    pub valid: bool,
    /// Decimal degrees, zero when the message carried no real fix
    pub latitude: f64,
    pub longitude: f64,
    /// Speed over ground in knots
    pub speed: f64,
    /// Course over ground in degrees, when reported
    pub course: Option<f64>,
    /// Altitude in meters, when reported
    pub altitude: Option<f64>,
    /// Estimated accuracy in meters, for satellite fixes
    pub accuracy: Option<f64>,
    pub attributes: HashMap<String, AttributeValue>,
    pub network: Option<Network>,
}

impl Position {
    /// Create an empty record for a resolved device
    pub fn new(protocol: &'static str, device_id: DeviceId, time: DateTime<Utc>) -> Self {
        Self {
            device_id,
            protocol,
            time,
            valid: false,
            latitude: 0.0,
            longitude: 0.0,
            speed: 0.0,
            course: None,
            altitude: None,
            accuracy: None,
            attributes: HashMap::new(),
            network: None,
        }
    }

    /// Set an attribute (create or overwrite)
    pub fn set(&mut self, key: &str, value: impl Into<AttributeValue>) {
        self.attributes.insert(key.to_string(), value.into());
    }

    /// Get an attribute by key
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_attribute_set_and_get() {
        let time = Utc.with_ymd_and_hms(2017, 1, 5, 15, 47, 45).unwrap();
        let mut position = Position::new("tk103", DeviceId(1), time);

        position.set(keys::IGNITION, true);
        position.set(keys::POWER, 85i64);
        position.set(keys::ALARM, alarms::SOS);

        assert_eq!(
            position.attribute(keys::IGNITION),
            Some(&AttributeValue::Bool(true))
        );
        assert_eq!(
            position.attribute(keys::POWER),
            Some(&AttributeValue::Int(85))
        );
        assert_eq!(
            position.attribute(keys::ALARM),
            Some(&AttributeValue::Text("sos".to_string()))
        );
        assert!(position.attribute(keys::FUEL).is_none());
    }

    #[test]
    fn test_network_is_empty() {
        let mut network = Network::default();
        assert!(network.is_empty());

        network.cell_towers.push(CellTower {
            mcc: 240,
            mnc: 1,
            lac: 5015,
            cid: 40601,
        });
        assert!(!network.is_empty());
    }
}
