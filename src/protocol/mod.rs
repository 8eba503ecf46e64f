//! TK103 / T580W wire protocol.
//!
//! The device family speaks a delimited, comma-separated ASCII protocol.
//! One frame carries one of three message shapes, classified in a fixed
//! priority order (see [`ProtocolDecoder`] for why the order matters):
//!
//! | Shape | Example body | Yields |
//! |-------|--------------|--------|
//! | Battery report | `013632651491,ZC20,180716,144222,6,392,65535,255` | stored snapshot, no record |
//! | Network report | `864768010887682,DW5B,240,1,5015,40601,3,MAC*-55*11,...,051216,014802` | record, `valid = false` |
//! | Position report | `864768010869060,DW30,050117,A,5135.82713N,00001.17918E,0.089,154745,000.0,43.40,12` | record |
//!
//! Outbound commands travel the other way as SMS-style text wrapped in
//! the `[begin]sms2,<body>,[end]` envelope (see [`encode_command`]).

mod alarm;
mod battery;
mod decoder;
mod encoder;
mod frame;
mod parser;

pub use battery::{BatterySnapshot, BatteryStore};
pub use decoder::ProtocolDecoder;
pub use encoder::encode_command;
pub use frame::{FrameSplitter, MAX_FRAME_LENGTH};

/// Adapter name attached to every emitted position
pub const PROTOCOL_NAME: &str = "tk103";
