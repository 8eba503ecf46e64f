//! Command encoding tests over the public API.

use disha_gw::core::command::Command;
use disha_gw::protocol::encode_command;

#[test]
fn all_command_bodies() {
    let cases = [
        (Command::SinglePosition, "[begin]sms2,*getposl*,[end]"),
        (Command::RealtimeTracking, "[begin]sms2,*routetrack*99*,[end]"),
        (
            Command::RealtimeTrackingStop,
            "[begin]sms2,*routetrackoff*,[end]",
        ),
        (Command::DeepSleepInterval2h, "[begin]sms2,*sleep*2*,[end]"),
        (Command::DeepSleepMotion, "[begin]sms2,*sleepv*,[end]"),
        (Command::DeepSleepOff, "[begin]sms2,*sleepoff*,[end]"),
        (Command::SosOn, "[begin]sms2,*soson*,[end]"),
        (Command::SosOff, "[begin]sms2,*sosoff*,[end]"),
        (Command::MultiControllerOn, "[begin]sms2,*multiquery*,[end]"),
        (
            Command::MultiControllerOff,
            "[begin]sms2,*multiqueryoff*,[end]",
        ),
        (Command::Reboot, "[begin]sms2,88888888,[end]"),
    ];

    for (command, expected) in cases {
        assert_eq!(encode_command(command), expected, "{:?}", command);
    }
}

#[test]
fn sos_enable_flag() {
    assert_eq!(
        encode_command(Command::Sos { enable: true }),
        "[begin]sms2,*soson*,[end]"
    );
    assert_eq!(
        encode_command(Command::Sos { enable: false }),
        "[begin]sms2,*sosoff*,[end]"
    );
}

#[test]
fn no_trailing_terminator() {
    // Framing/termination is the transport's responsibility
    let encoded = encode_command(Command::Reboot);
    assert!(!encoded.ends_with('\n'));
    assert!(!encoded.ends_with('\r'));
}

#[test]
fn dispatch_boundary_round_trip() {
    // External dispatchers submit commands as tagged JSON; unknown tags
    // are dropped, known tags encode to the firmware literal
    let command = Command::from_json(r#"{"type":"sos","enable":true}"#).unwrap();
    assert_eq!(encode_command(command), "[begin]sms2,*soson*,[end]");

    assert_eq!(Command::from_json(r#"{"type":"engineStop"}"#), None);
}
