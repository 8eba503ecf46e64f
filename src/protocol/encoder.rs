//! Outbound command encoding.
//!
//! Commands reach the device as SMS-style text in a fixed envelope. The
//! body literals are firmware-defined and must match exactly; the match
//! below is exhaustive over [`Command`], so an unencodable intent cannot
//! exist.

use crate::core::command::Command;

/// Wrap a command body in the transport envelope.
/// No terminator is appended; framing belongs to the transport.
fn wrap(body: &str) -> String {
    format!("[begin]sms2,{},[end]", body)
}

/// Encode a command intent as the literal text the firmware expects
pub fn encode_command(command: Command) -> String {
    match command {
        Command::SinglePosition => wrap("*getposl*"),
        Command::RealtimeTracking => wrap("*routetrack*99*"),
        Command::RealtimeTrackingStop => wrap("*routetrackoff*"),
        Command::DeepSleepInterval2h => wrap("*sleep*2*"),
        Command::DeepSleepMotion => wrap("*sleepv*"),
        Command::DeepSleepOff => wrap("*sleepoff*"),
        Command::SosOn => wrap("*soson*"),
        Command::SosOff => wrap("*sosoff*"),
        Command::Sos { enable } => wrap(if enable { "*soson*" } else { "*sosoff*" }),
        Command::MultiControllerOn => wrap("*multiquery*"),
        Command::MultiControllerOff => wrap("*multiqueryoff*"),
        Command::Reboot => wrap("88888888"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope() {
        assert_eq!(encode_command(Command::Reboot), "[begin]sms2,88888888,[end]");
        assert_eq!(
            encode_command(Command::SinglePosition),
            "[begin]sms2,*getposl*,[end]"
        );
    }

    #[test]
    fn test_sos_enable_flag() {
        assert_eq!(
            encode_command(Command::Sos { enable: true }),
            encode_command(Command::SosOn)
        );
        assert_eq!(
            encode_command(Command::Sos { enable: false }),
            encode_command(Command::SosOff)
        );
    }
}
