//! Configuration for the DishaGW daemon
//!
//! Loads configuration from a TOML file with the few parameters the
//! gateway needs: bind addresses, protocol options, logging, and the
//! position sink.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Source unit of the speed field in position reports
///
/// The firmware ships with km/h speed reporting; some variants are
/// configured for knots or mph. The decoder always normalizes to knots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedUnit {
    /// Device already reports knots
    Kn,
    /// Device reports miles per hour
    Mph,
    /// Device reports km/h (firmware default)
    #[default]
    Kmh,
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub protocol: ProtocolConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub sink: SinkConfig,
}

/// Listener configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// TCP bind address for the delimiter-framed device stream
    pub tcp_bind: String,
    /// UDP bind address (one datagram = one frame)
    pub udp_bind: String,
}

/// Protocol options
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProtocolConfig {
    /// Source unit of the speed field (`kn`, `mph`, `kmh`)
    #[serde(default)]
    pub speed_unit: SpeedUnit,
    /// Assign an internal id to previously unseen device identifiers.
    /// When false, messages from unknown devices are discarded.
    #[serde(default = "default_auto_register")]
    pub auto_register: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

/// Position sink configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SinkConfig {
    /// Emit each decoded position as a JSON line on stdout
    #[serde(default)]
    pub emit_json: bool,
}

fn default_auto_register() -> bool {
    true
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            tcp_bind: "0.0.0.0:5002".to_string(),
            udp_bind: "0.0.0.0:5002".to_string(),
        }
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            speed_unit: SpeedUnit::Kmh,
            auto_register: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self { emit_json: false }
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }
}
