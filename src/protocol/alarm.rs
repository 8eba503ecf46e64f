//! Status code table for the TK103 family.
//!
//! Every message carries a 4-character status code. Three firmware code
//! namespaces (ZC, DW3x/DW4x, DW5x/DW6x) express the same alarm set, so
//! the mapping is many-to-one and never ambiguous. Unknown codes are
//! inert: the message still parses, it just sets no status attribute.

use crate::core::position::alarms;

/// Effect of a recognized status code on the position record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatusEffect {
    /// Set the alarm attribute
    Alarm(&'static str),
    /// Set the ignition attribute
    Ignition(bool),
    /// Set the fuel attribute (0.0 = cut, 1.0 = restored)
    Fuel(f64),
}

/// Look up the effect of a 4-character status code
pub fn status_effect(code: &str) -> Option<StatusEffect> {
    match code {
        // Motion alert
        "ZC11" | "DW31" | "DW51" => Some(StatusEffect::Alarm(alarms::MOVEMENT)),
        // Low battery alert
        "ZC12" | "DW32" | "DW52" => Some(StatusEffect::Alarm(alarms::LOW_BATTERY)),
        // Power cut alert
        "ZC13" | "DW33" | "DW53" => Some(StatusEffect::Alarm(alarms::POWER_CUT)),
        // Dismounting alert
        "ZC17" | "DW37" | "DW57" => Some(StatusEffect::Alarm(alarms::DISMOUNTING)),
        // SOS alert
        "ZC25" | "DW3E" | "DW5E" => Some(StatusEffect::Alarm(alarms::SOS)),
        // Case opened alert
        "ZC26" | "DW3F" | "DW5F" => Some(StatusEffect::Alarm(alarms::OPENED)),
        // Low external voltage alert
        "ZC27" | "DW40" | "DW60" => Some(StatusEffect::Alarm(alarms::LOW_VOLTAGE)),
        // Bad battery alert
        "ZC28" | "DW41" | "DW61" => Some(StatusEffect::Alarm(alarms::BAD_BATTERY)),
        // Ignition alert / ACC on
        "ZC29" | "DW42" | "DW62" | "ZC15" | "DW35" | "DW55" => Some(StatusEffect::Ignition(true)),
        // ACC off
        "ZC16" | "DW36" | "DW56" => Some(StatusEffect::Ignition(false)),
        // Fuel cut engaged
        "ZC2A" | "DW43" | "DW63" => Some(StatusEffect::Fuel(0.0)),
        // Fuel cut released
        "ZC2B" | "DW44" | "DW64" => Some(StatusEffect::Fuel(1.0)),
        // Fuel cut alert
        "ZC2C" | "DW45" | "DW65" => Some(StatusEffect::Alarm(alarms::FUEL_CUT)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_effect_across_namespaces() {
        for code in ["ZC25", "DW3E", "DW5E"] {
            assert_eq!(status_effect(code), Some(StatusEffect::Alarm(alarms::SOS)));
        }
        for code in ["ZC15", "DW35", "DW55", "ZC29", "DW42", "DW62"] {
            assert_eq!(status_effect(code), Some(StatusEffect::Ignition(true)));
        }
    }

    #[test]
    fn test_fuel_codes() {
        assert_eq!(status_effect("ZC2A"), Some(StatusEffect::Fuel(0.0)));
        assert_eq!(status_effect("ZC2B"), Some(StatusEffect::Fuel(1.0)));
        assert_eq!(
            status_effect("ZC2C"),
            Some(StatusEffect::Alarm(alarms::FUEL_CUT))
        );
    }

    #[test]
    fn test_unknown_codes_are_inert() {
        assert_eq!(status_effect("ZC20"), None);
        assert_eq!(status_effect("DW30"), None);
        assert_eq!(status_effect("BP05"), None);
        assert_eq!(status_effect(""), None);
    }
}
