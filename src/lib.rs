//! DishaGW - Protocol gateway for TK103-family GPS trackers
//!
//! This library provides the decode/encode engine for the TK103 and
//! T580W tracker firmware families and the transport shell the daemon
//! binary runs it in.
//!
//! - [`protocol`]: frame splitting, message classification, battery
//!   correlation, status codes, command encoding
//! - [`core`]: position records, command intents, the device registry seam
//! - [`server`]: TCP/UDP listeners and the position sink

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod server;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{Error, Result};
