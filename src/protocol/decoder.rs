//! Message semantics: classified sentences become position records.
//!
//! The decoder owns everything the structural layer must not know about:
//! device identity resolution, the battery correlation store, the status
//! code table, last-known-location fallback, and unit conversion.
//!
//! # Pipeline
//!
//! ```text
//! frame ──strip envelope──> body ──classify──> Sentence ──semantics──> Option<Position>
//! ```
//!
//! A `None` result covers three distinct, equally normal cases:
//! - the frame matched no grammar (noisy field input, dropped silently)
//! - the device identity did not resolve (hard discard, no partial output)
//! - a battery report was consumed into the correlation store
//!
//! No error leaves this path for malformed input; only transport faults
//! propagate, and those terminate a single connection, not the process.

use super::PROTOCOL_NAME;
use super::alarm::{StatusEffect, status_effect};
use super::battery::{BatterySnapshot, BatteryStore};
use super::parser::{self, BatteryReport, NetworkReport, PositionReport, Sentence};
use crate::config::SpeedUnit;
use crate::core::position::{DeviceId, Network, Position, keys};
use crate::core::registry::DeviceRegistry;
use std::net::SocketAddr;
use std::sync::Arc;

/// Accuracy in meters attached to satellite-fix reports
const FIX_ACCURACY: f64 = 5.0;

/// km/h per knot
const KPH_PER_KNOT: f64 = 1.852;

/// mph per knot
const MPH_PER_KNOT: f64 = 1.150779;

/// Normalize a reported speed to knots
fn knots_from(unit: SpeedUnit, value: f64) -> f64 {
    match unit {
        SpeedUnit::Kn => value,
        SpeedUnit::Mph => value / MPH_PER_KNOT,
        SpeedUnit::Kmh => value / KPH_PER_KNOT,
    }
}

/// Envelope-open marker for the TCP family
const ENVELOPE_OPEN: char = '(';

/// Drop everything up to and including the first envelope-open marker.
/// Absence of the marker is normal (UDP, some message shapes).
fn strip_envelope(frame: &str) -> &str {
    match frame.find(ENVELOPE_OPEN) {
        Some(idx) => &frame[idx + ENVELOPE_OPEN.len_utf8()..],
        None => frame,
    }
}

/// Stateful decoder shared by all connection handlers
pub struct ProtocolDecoder {
    registry: Arc<dyn DeviceRegistry>,
    battery: Arc<BatteryStore>,
    speed_unit: SpeedUnit,
}

impl ProtocolDecoder {
    pub fn new(
        registry: Arc<dyn DeviceRegistry>,
        battery: Arc<BatteryStore>,
        speed_unit: SpeedUnit,
    ) -> Self {
        Self {
            registry,
            battery,
            speed_unit,
        }
    }

    /// Decode one frame into a position record, if it yields one
    pub fn decode(&self, frame: &str, remote: SocketAddr) -> Option<Position> {
        let body = strip_envelope(frame);
        match parser::classify(body)? {
            Sentence::Battery(report) => {
                self.handle_battery(report, remote);
                None
            }
            Sentence::Network(report) => self.handle_network(report, remote),
            Sentence::Position(report) => self.handle_position(report, remote),
        }
    }

    fn handle_battery(&self, report: BatteryReport, remote: SocketAddr) {
        let Some(device_id) = self.registry.resolve(&report.device, remote) else {
            return;
        };
        // Stored only; the snapshot rides along on the next position
        // message for this device
        let snapshot = BatterySnapshot::from_raw(report.level, report.voltage, report.time);
        log::debug!("Battery snapshot for {:?}: {:?}", device_id, snapshot);
        self.battery.put(device_id, snapshot);
    }

    fn handle_network(&self, report: NetworkReport, remote: SocketAddr) -> Option<Position> {
        let device_id = self.registry.resolve(&report.device, remote)?;
        let mut position = Position::new(PROTOCOL_NAME, device_id, report.time);
        apply_status(&mut position, &report.status);

        // Fallback coordinates for continuity only. This is not the
        // device's own fix, so valid stays false no matter what was
        // copied in; the record keeps the report's own timestamp because
        // an alarm at boot may arrive long after the last real fix.
        if let Some(last) = self.registry.last_known(device_id) {
            position.latitude = last.latitude;
            position.longitude = last.longitude;
            position.speed = last.speed;
            position.course = last.course;
            position.altitude = last.altitude;
        }
        position.valid = false;

        self.merge_battery(&mut position, device_id);

        let mut network = Network::default();
        network.cell_towers.push(report.cell);
        if report.wifi.len() == report.declared_wifi {
            network.wifi_access_points = report.wifi;
        } else {
            log::debug!(
                "Wi-Fi count mismatch from {:?}: declared {}, found {}",
                device_id,
                report.declared_wifi,
                report.wifi.len()
            );
        }
        if !network.is_empty() {
            position.network = Some(network);
        }

        Some(position)
    }

    fn handle_position(&self, report: PositionReport, remote: SocketAddr) -> Option<Position> {
        let device_id = self.registry.resolve(&report.device, remote)?;
        let mut position = Position::new(PROTOCOL_NAME, device_id, report.time);
        apply_status(&mut position, &report.status);
        self.merge_battery(&mut position, device_id);

        position.valid = report.valid;
        position.latitude = report.latitude;
        position.longitude = report.longitude;
        position.speed = knots_from(self.speed_unit, report.speed);
        position.course = report.course;
        position.altitude = report.altitude;
        position.accuracy = Some(FIX_ACCURACY);
        if let Some(rssi) = report.rssi {
            position.set(keys::RSSI, i64::from(rssi));
        }

        Some(position)
    }

    fn merge_battery(&self, position: &mut Position, device_id: DeviceId) {
        if let Some(snapshot) = self.battery.get(device_id) {
            if let Some(level) = snapshot.level {
                position.set(keys::POWER, i64::from(level));
            }
            if let Some(voltage) = snapshot.voltage {
                position.set(keys::BATTERY, voltage);
            }
        }
    }
}

fn apply_status(position: &mut Position, code: &str) {
    match status_effect(code) {
        Some(StatusEffect::Alarm(name)) => position.set(keys::ALARM, name),
        Some(StatusEffect::Ignition(on)) => position.set(keys::IGNITION, on),
        Some(StatusEffect::Fuel(level)) => position.set(keys::FUEL, level),
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_envelope() {
        assert_eq!(strip_envelope("(864768,DW30"), "864768,DW30");
        assert_eq!(strip_envelope("\n\n\n(864768,DW30"), "864768,DW30");
        assert_eq!(strip_envelope("864768,DW30"), "864768,DW30");
    }

    #[test]
    fn test_knots_from() {
        assert_eq!(knots_from(SpeedUnit::Kn, 4.8), 4.8);
        assert!((knots_from(SpeedUnit::Kmh, 1.852) - 1.0).abs() < 1e-9);
        assert!((knots_from(SpeedUnit::Mph, 1.150779) - 1.0).abs() < 1e-9);
    }
}
