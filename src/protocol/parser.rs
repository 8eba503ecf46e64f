//! Structural grammars for the three message shapes.
//!
//! This layer is pure: it turns a message body into a tagged [`Sentence`]
//! or `None`, with no session state and no side effects. Semantics
//! (identity resolution, correlation, unit conversion) live in the
//! decoder.
//!
//! [`classify`] tries the grammars in a fixed order:
//!
//! 1. battery report
//! 2. network/geolocation report
//! 3. position report
//!
//! The order is load-bearing. The battery and network shapes would also
//! satisfy a loose reading of the position field layout, so trying the
//! position grammar first would reject them as malformed position reports
//! and drop them.
//!
//! Field notes:
//! - dates are reversed two-digit day/month/year, years 2000-based
//! - coordinates are degrees + decimal minutes with a hemisphere suffix
//!   (`4527.3513N`: 45° + 27.3513′)
//! - the position speed token must contain a decimal point
//! - position course/altitude/rssi are strictly nested optionals: each is
//!   attempted only if the previous one matched
//!
//! Anything that fails a grammar falls through; anything that fails all
//! three is dropped without error. Field firmware emits partial and
//! corrupted frames routinely, particularly at boot or low signal.

use crate::core::position::{CellTower, WifiAccessPoint};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Structurally classified message body
#[derive(Debug, Clone, PartialEq)]
pub enum Sentence {
    Battery(BatteryReport),
    Network(NetworkReport),
    Position(PositionReport),
}

/// Battery report: `id,CCCC,ddmmyy,hhmmss,level,voltage,input,installed`
///
/// The last two integers are part of the shape but carry nothing we use.
/// Raw level/voltage are kept as sent; sentinel suppression happens when
/// the snapshot is built.
#[derive(Debug, Clone, PartialEq)]
pub struct BatteryReport {
    pub device: String,
    pub time: DateTime<Utc>,
    pub level: u32,
    pub voltage: u32,
}

/// Network/geolocation report:
/// `id,CCCC,mcc,mnc,lac,cid,count,[mac*rssi*ch,]*ddmmyy,hhmmss...`
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkReport {
    pub device: String,
    pub status: String,
    pub cell: CellTower,
    /// Wi-Fi entry count the device claimed to send
    pub declared_wifi: usize,
    /// Wi-Fi entries actually present
    pub wifi: Vec<WifiAccessPoint>,
    pub time: DateTime<Utc>,
}

/// Position report:
/// `id,CCCC,ddmmyy,A|V,lat,lon,speed,hhmmss[,course[,altitude[,rssi]]][)]`
#[derive(Debug, Clone, PartialEq)]
pub struct PositionReport {
    pub device: String,
    pub status: String,
    pub valid: bool,
    pub latitude: f64,
    pub longitude: f64,
    /// Speed as sent, in the device's configured source unit
    pub speed: f64,
    pub time: DateTime<Utc>,
    pub course: Option<f64>,
    pub altitude: Option<f64>,
    pub rssi: Option<u32>,
}

/// Try the three grammars in priority order; the first match wins
pub fn classify(body: &str) -> Option<Sentence> {
    if let Some(report) = parse_battery(body) {
        return Some(Sentence::Battery(report));
    }
    if let Some(report) = parse_network(body) {
        return Some(Sentence::Network(report));
    }
    parse_position(body).map(Sentence::Position)
}

/// Comma-separated field cursor
struct Fields<'a> {
    rest: Option<&'a str>,
}

impl<'a> Fields<'a> {
    fn new(body: &'a str) -> Self {
        Self { rest: Some(body) }
    }

    fn next(&mut self) -> Option<&'a str> {
        let rest = self.rest?;
        match rest.find(',') {
            Some(idx) => {
                self.rest = Some(&rest[idx + 1..]);
                Some(&rest[..idx])
            }
            None => {
                self.rest = None;
                Some(rest)
            }
        }
    }
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Parse an unsigned decimal field; rejects signs and whitespace
fn parse_unsigned<T: std::str::FromStr>(s: &str) -> Option<T> {
    if !all_digits(s) {
        return None;
    }
    s.parse().ok()
}

/// Reversed date (`ddmmyy`) plus time (`hhmmss`), 2000-based years.
/// Out-of-range components make the surrounding grammar fail.
fn parse_datetime(date: &str, time: &str) -> Option<DateTime<Utc>> {
    if date.len() != 6 || !all_digits(date) || time.len() != 6 || !all_digits(time) {
        return None;
    }
    let day: u32 = date[0..2].parse().ok()?;
    let month: u32 = date[2..4].parse().ok()?;
    let year: i32 = date[4..6].parse().ok()?;
    let hour: u32 = time[0..2].parse().ok()?;
    let minute: u32 = time[2..4].parse().ok()?;
    let second: u32 = time[4..6].parse().ok()?;

    let date = NaiveDate::from_ymd_opt(2000 + year, month, day)?;
    let time = NaiveTime::from_hms_opt(hour, minute, second)?;
    Some(date.and_time(time).and_utc())
}

/// Degrees + decimal minutes with a hemisphere suffix, e.g. `4527.3513N`.
/// The two digits before the dot are whole minutes; everything before
/// them is whole degrees.
fn parse_coordinate(token: &str, positive: char, negative: char) -> Option<f64> {
    let hemisphere = token.chars().last()?;
    let sign = if hemisphere == positive {
        1.0
    } else if hemisphere == negative {
        -1.0
    } else {
        return None;
    };
    let value = &token[..token.len() - hemisphere.len_utf8()];

    let dot = value.find('.')?;
    if dot < 3 {
        return None;
    }
    let (degrees, minutes) = value.split_at(dot - 2);
    if !all_digits(degrees) {
        return None;
    }
    // Minutes must be `dd.d+`
    let bytes = minutes.as_bytes();
    if bytes.len() < 4
        || !bytes[0].is_ascii_digit()
        || !bytes[1].is_ascii_digit()
        || bytes[2] != b'.'
        || !bytes[3..].iter().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let degrees: f64 = degrees.parse().ok()?;
    let minutes: f64 = minutes.parse().ok()?;
    Some(sign * (degrees + minutes / 60.0))
}

/// Speed token: `d+.d+`, decimal point required
fn parse_speed(token: &str) -> Option<f64> {
    let (int, frac) = token.split_once('.')?;
    if !all_digits(int) || !all_digits(frac) {
        return None;
    }
    token.parse().ok()
}

/// Trailing course/altitude token: `d+.d{1,2}` or at least two plain digits
fn parse_trailing_number(token: &str) -> Option<f64> {
    match token.split_once('.') {
        Some((int, frac)) => {
            if !all_digits(int) || !(1..=2).contains(&frac.len()) || !all_digits(frac) {
                return None;
            }
        }
        None => {
            if token.len() < 2 || !all_digits(token) {
                return None;
            }
        }
    }
    token.parse().ok()
}

/// `MAC*signed-rssi*channel`, e.g. `30:15:A8:E7:86:C8*-55*11`
fn parse_wifi_entry(token: &str) -> Option<WifiAccessPoint> {
    let mut parts = token.split('*');
    let mac = parts.next()?;
    let rssi = parts.next()?;
    let channel = parts.next()?;
    if parts.next().is_some() || !is_mac(mac) {
        return None;
    }
    Some(WifiAccessPoint {
        mac: mac.to_string(),
        rssi: rssi.parse().ok()?,
        channel: parse_unsigned(channel)?,
    })
}

fn is_mac(s: &str) -> bool {
    let mut groups = 0;
    for group in s.split(':') {
        if group.len() != 2 || !group.bytes().all(|b| b.is_ascii_hexdigit()) {
            return false;
        }
        groups += 1;
    }
    groups == 6
}

fn parse_battery(body: &str) -> Option<BatteryReport> {
    let mut fields = Fields::new(body);
    let device = fields.next().filter(|s| all_digits(s))?;
    let _status = fields.next().filter(|s| s.len() == 4)?;
    let date = fields.next()?;
    let time = parse_datetime(date, fields.next()?)?;
    let level = parse_unsigned(fields.next()?)?;
    let voltage = parse_unsigned(fields.next()?)?;
    // Input voltage and installed flag: consumed, not extracted
    parse_unsigned::<u32>(fields.next()?)?;
    parse_unsigned::<u32>(fields.next()?)?;
    if fields.next().is_some() {
        return None;
    }
    Some(BatteryReport {
        device: device.to_string(),
        time,
        level,
        voltage,
    })
}

fn parse_network(body: &str) -> Option<NetworkReport> {
    let mut fields = Fields::new(body);
    let device = fields.next().filter(|s| all_digits(s))?;
    let status = fields.next().filter(|s| s.len() == 4)?;
    let mcc = parse_unsigned(fields.next()?)?;
    let mnc = parse_unsigned(fields.next()?)?;
    let lac = parse_unsigned(fields.next()?)?;
    let cid = parse_unsigned(fields.next()?)?;
    let declared_wifi = parse_unsigned(fields.next()?)?;

    let mut wifi = Vec::new();
    let mut token = fields.next()?;
    while token.contains('*') {
        wifi.push(parse_wifi_entry(token)?);
        token = fields.next()?;
    }

    // `token` is now the date; trailing content after the six time digits
    // is ignored, as is anything in later fields
    let date = token;
    let time = parse_datetime(date, fields.next()?.get(..6)?)?;

    Some(NetworkReport {
        device: device.to_string(),
        status: status.to_string(),
        cell: CellTower { mcc, mnc, lac, cid },
        declared_wifi,
        wifi,
        time,
    })
}

fn parse_position(body: &str) -> Option<PositionReport> {
    let body = body.strip_suffix(')').unwrap_or(body);
    let mut fields = Fields::new(body);
    let device = fields.next().filter(|s| all_digits(s))?;
    let status = fields.next().filter(|s| s.len() == 4)?;
    let date = fields.next()?;
    let valid = match fields.next()? {
        "A" => true,
        "V" => false,
        _ => return None,
    };
    let latitude = parse_coordinate(fields.next()?, 'N', 'S')?;
    let longitude = parse_coordinate(fields.next()?, 'E', 'W')?;
    let speed = parse_speed(fields.next()?)?;
    let time = parse_datetime(date, fields.next()?)?;

    let mut course = None;
    let mut altitude = None;
    let mut rssi = None;
    if let Some(token) = fields.next() {
        course = Some(parse_trailing_number(token)?);
        if let Some(token) = fields.next() {
            altitude = Some(parse_trailing_number(token)?);
            if let Some(token) = fields.next() {
                rssi = Some(parse_unsigned(token)?);
                if fields.next().is_some() {
                    return None;
                }
            }
        }
    }

    Some(PositionReport {
        device: device.to_string(),
        status: status.to_string(),
        valid,
        latitude,
        longitude,
        speed,
        time,
        course,
        altitude,
        rssi,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_classify_battery() {
        let sentence = classify("013632651491,ZC20,180716,144222,6,392,65535,255").unwrap();
        let Sentence::Battery(report) = sentence else {
            panic!("expected battery report, got {:?}", sentence);
        };
        assert_eq!(report.device, "013632651491");
        assert_eq!(report.level, 6);
        assert_eq!(report.voltage, 392);
        assert_eq!(
            report.time,
            Utc.with_ymd_and_hms(2016, 7, 18, 14, 42, 22).unwrap()
        );
    }

    #[test]
    fn test_battery_rejects_trailing_content() {
        // The battery shape is an exact match; an un-stripped delimiter or
        // extra fields push the message to the other grammars
        assert!(parse_battery("013632651493,ZC20,040613,040137,6,42,112,0)").is_none());
        assert!(parse_battery("013632651493,ZC20,040613,040137,6,42,112,0,9").is_none());
        assert!(parse_battery("013632651493,ZC20,040613,040137,6,42,112,0").is_some());
    }

    #[test]
    fn test_classify_network_with_wifi() {
        let body = "864768010887682,DW5B,240,1,5015,40601,3,\
                    30:15:A8:E7:86:C8*-55*11,42:66:DE:EA:BC:2E*-78*1,\
                    4C:60:DE:0A:BB:22*-79*1,051216,014802";
        let Sentence::Network(report) = classify(body).unwrap() else {
            panic!("expected network report");
        };
        assert_eq!(report.device, "864768010887682");
        assert_eq!(report.status, "DW5B");
        assert_eq!(
            report.cell,
            CellTower {
                mcc: 240,
                mnc: 1,
                lac: 5015,
                cid: 40601
            }
        );
        assert_eq!(report.declared_wifi, 3);
        assert_eq!(report.wifi.len(), 3);
        assert_eq!(report.wifi[0].mac, "30:15:A8:E7:86:C8");
        assert_eq!(report.wifi[0].rssi, -55);
        assert_eq!(report.wifi[0].channel, 11);
        assert_eq!(
            report.time,
            Utc.with_ymd_and_hms(2016, 12, 5, 1, 48, 2).unwrap()
        );
    }

    #[test]
    fn test_network_without_wifi_entries() {
        let body = "864768010887682,DW5B,240,1,5015,40601,0,051216,014802";
        let Sentence::Network(report) = classify(body).unwrap() else {
            panic!("expected network report");
        };
        assert_eq!(report.declared_wifi, 0);
        assert!(report.wifi.is_empty());
    }

    #[test]
    fn test_network_count_mismatch_still_parses() {
        let body = "864768010887682,DW5B,240,1,5015,40601,5,\
                    30:15:A8:E7:86:C8*-55*11,051216,014802";
        let Sentence::Network(report) = classify(body).unwrap() else {
            panic!("expected network report");
        };
        assert_eq!(report.declared_wifi, 5);
        assert_eq!(report.wifi.len(), 1);
    }

    #[test]
    fn test_malformed_wifi_entry_fails_grammar() {
        let body = "864768010887682,DW5B,240,1,5015,40601,1,\
                    30:15:A8*-55*11,051216,014802";
        assert!(parse_network(body).is_none());
    }

    #[test]
    fn test_classify_position_full() {
        let body = "864768010869060,DW30,050117,A,5135.82713N,00001.17918E,0.089,154745,000.0,43.40,12";
        let Sentence::Position(report) = classify(body).unwrap() else {
            panic!("expected position report");
        };
        assert_eq!(report.device, "864768010869060");
        assert_eq!(report.status, "DW30");
        assert!(report.valid);
        assert!((report.latitude - (51.0 + 35.82713 / 60.0)).abs() < 1e-9);
        assert!((report.longitude - (0.0 + 1.17918 / 60.0)).abs() < 1e-9);
        assert_eq!(
            report.time,
            Utc.with_ymd_and_hms(2017, 1, 5, 15, 47, 45).unwrap()
        );
        assert_eq!(report.course, Some(0.0));
        assert_eq!(report.altitude, Some(43.40));
        assert_eq!(report.rssi, Some(12));
    }

    #[test]
    fn test_position_nested_optionals() {
        let base = "013632651491,BP05,040613,A,2234.0297N,11405.9101E,000.0,040137";
        let Sentence::Position(report) = classify(base).unwrap() else {
            panic!("expected position report");
        };
        assert_eq!(report.course, None);
        assert_eq!(report.altitude, None);
        assert_eq!(report.rssi, None);

        let with_course = format!("{},178.48", base);
        let Sentence::Position(report) = classify(&with_course).unwrap() else {
            panic!("expected position report");
        };
        assert_eq!(report.course, Some(178.48));
        assert_eq!(report.altitude, None);
    }

    #[test]
    fn test_position_trailing_delimiter() {
        let body = "013632651491,BP05,040613,A,2234.0297N,11405.9101E,000.0,040137,178.48)";
        assert!(matches!(classify(body), Some(Sentence::Position(_))));
    }

    #[test]
    fn test_coordinate_parsing() {
        assert!((parse_coordinate("4527.3513N", 'N', 'S').unwrap() - 45.45586).abs() < 1e-5);
        assert!((parse_coordinate("00909.9758E", 'E', 'W').unwrap() - 9.16626).abs() < 1e-5);
        assert!((parse_coordinate("2234.0297S", 'N', 'S').unwrap() + (22.0 + 34.0297 / 60.0)).abs() < 1e-9);
        assert_eq!(parse_coordinate("0000.0000N", 'N', 'S'), Some(0.0));
        assert_eq!(parse_coordinate("4527.3513E", 'N', 'S'), None);
        assert_eq!(parse_coordinate("27.3513N", 'N', 'S'), None);
        assert_eq!(parse_coordinate("4527N", 'N', 'S'), None);
    }

    #[test]
    fn test_classification_order_battery_first() {
        // A battery body must never land in another grammar
        let body = "013632651492,ZC20,040613,040137,6,421,112,0";
        assert!(matches!(classify(body), Some(Sentence::Battery(_))));
    }

    #[test]
    fn test_unmatched_input_is_dropped() {
        assert_eq!(classify(""), None);
        assert_eq!(classify("garbage"), None);
        // Speed without a decimal point fails the position grammar
        assert_eq!(
            classify("013632651491,BP05,040613,A,2234.0297N,11405.9101E,000,040137"),
            None
        );
        // Truncated boot-time frame
        assert_eq!(classify("864768010869060,DW30,0501"), None);
    }
}
