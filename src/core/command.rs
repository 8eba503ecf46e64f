//! Outbound command intents for the tracker family.
//!
//! The supported set is a closed enum so the encoder stays exhaustive;
//! adding a firmware command means adding a variant and the compiler
//! points at every site that must handle it.
//!
//! External dispatchers submit commands as tagged JSON, e.g.
//! `{"type": "reboot"}` or `{"type": "sos", "enable": true}`. An
//! unrecognized tag is a reporting condition, not a fault: it is logged
//! and yields no output.

use serde::{Deserialize, Serialize};

/// Command intents understood by the device firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    /// Request a single position report
    SinglePosition,
    /// Start continuous realtime tracking
    RealtimeTracking,
    /// Stop realtime tracking
    RealtimeTrackingStop,
    /// Deep sleep, waking every two hours
    DeepSleepInterval2h,
    /// Deep sleep, waking on motion
    DeepSleepMotion,
    /// Disable deep sleep
    DeepSleepOff,
    /// Arm the SOS alarm
    SosOn,
    /// Disarm the SOS alarm
    SosOff,
    /// SOS alarm driven by an enable flag
    Sos { enable: bool },
    /// Enable the multi-controller
    MultiControllerOn,
    /// Disable the multi-controller
    MultiControllerOff,
    /// Reboot the device
    Reboot,
}

impl Command {
    /// Parse a command submitted as tagged JSON.
    ///
    /// Unsupported command types are logged and dropped; the caller must
    /// handle the `None` result.
    pub fn from_json(input: &str) -> Option<Command> {
        match serde_json::from_str(input) {
            Ok(command) => Some(command),
            Err(e) => {
                log::warn!("Unsupported command: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_json_round_trip() {
        let json = serde_json::to_string(&Command::Sos { enable: true }).unwrap();
        assert_eq!(json, r#"{"type":"sos","enable":true}"#);

        let parsed = Command::from_json(&json).unwrap();
        assert_eq!(parsed, Command::Sos { enable: true });
    }

    #[test]
    fn test_unit_variants_by_tag() {
        assert_eq!(
            Command::from_json(r#"{"type":"reboot"}"#),
            Some(Command::Reboot)
        );
        assert_eq!(
            Command::from_json(r#"{"type":"singlePosition"}"#),
            Some(Command::SinglePosition)
        );
        assert_eq!(
            Command::from_json(r#"{"type":"deepSleepInterval2h"}"#),
            Some(Command::DeepSleepInterval2h)
        );
    }

    #[test]
    fn test_unknown_type_is_dropped() {
        assert_eq!(Command::from_json(r#"{"type":"engineStop"}"#), None);
        assert_eq!(Command::from_json("not json"), None);
    }
}
