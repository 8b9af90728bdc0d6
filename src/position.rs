//! Position source for the sensor node
//!
//! The GPS receiver streams NMEA sentences over a UART; the node feeds those
//! bytes in every loop and reads back the latest fix.

use crate::conversion::convert_knots_to_kmph;
use crate::types::{PositionFix, UtcTime};
use log::debug;
use nmea0183::{ParseResult, Parser};

pub trait PositionSource {
    /// Current fix; `valid` is false until the receiver reports a position
    fn poll(&mut self) -> PositionFix;
}

/// A source that always reports the same fix
#[derive(Debug, Clone, Default)]
pub struct FixedPositionSource(pub PositionFix);

impl PositionSource for FixedPositionSource {
    fn poll(&mut self) -> PositionFix {
        self.0.clone()
    }
}

/// Incremental RMC reader on top of the `nmea0183` byte parser
///
/// Only RMC is interpreted (status, position, speed and UTC time). Other
/// sentence types are ignored. Sentences the parser rejects, such as those
/// with a bad checksum, leave the current fix untouched.
pub struct NmeaPositionSource {
    parser: Parser,
    fix: PositionFix,
    sentences: u32,
    rejected: u32,
}

impl Default for NmeaPositionSource {
    fn default() -> Self {
        Self {
            parser: Parser::new(),
            fix: PositionFix::invalid(),
            sentences: 0,
            rejected: 0,
        }
    }
}

impl std::fmt::Debug for NmeaPositionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NmeaPositionSource")
            .field("fix", &self.fix)
            .field("sentences", &self.sentences)
            .field("rejected", &self.rejected)
            .finish()
    }
}

impl NmeaPositionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sentences the parser accepted, of any type
    pub fn sentences(&self) -> u32 {
        self.sentences
    }

    /// Sentences the parser refused
    pub fn rejected(&self) -> u32 {
        self.rejected
    }

    /// Feed raw UART bytes
    pub fn feed(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            match self.parser.parse_from_byte(byte) {
                None => {}
                Some(Ok(result)) => {
                    self.sentences += 1;
                    self.handle(result);
                }
                Some(Err(e)) => {
                    self.rejected += 1;
                    debug!("Discarding NMEA sentence: {}", e);
                }
            }
        }
    }

    fn handle(&mut self, result: ParseResult) {
        match result {
            ParseResult::RMC(Some(rmc)) => {
                self.fix = PositionFix {
                    valid: true,
                    latitude: rmc.latitude.as_f64(),
                    longitude: rmc.longitude.as_f64(),
                    speed_kmph: convert_knots_to_kmph(rmc.speed.as_knots() as f64),
                    time: Some(UtcTime {
                        hour: rmc.datetime.time.hours,
                        minute: rmc.datetime.time.minutes,
                        second: rmc.datetime.time.seconds as u8,
                    }),
                };
            }
            // Receiver reports no usable fix
            ParseResult::RMC(None) => self.fix.valid = false,
            _ => {}
        }
    }
}

impl PositionSource for NmeaPositionSource {
    fn poll(&mut self) -> PositionFix {
        self.fix.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RMC_VALID: &str = "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n";
    const RMC_VOID: &str = "$GPRMC,123519,V,,,,,,,230394,,*33\r\n";

    #[test]
    fn test_valid_rmc_sets_fix() {
        let mut gps = NmeaPositionSource::new();
        assert!(!gps.poll().valid);

        gps.feed(RMC_VALID.as_bytes());
        let fix = gps.poll();
        let (lat, lon) = fix.location().unwrap();
        assert!((lat - 48.1173).abs() < 1e-5);
        assert!((lon - 11.516_666_666).abs() < 1e-5);
        assert!((fix.speed_kmph - 22.4 * 1.852).abs() < 1e-3);
        assert_eq!(
            fix.time,
            Some(UtcTime {
                hour: 12,
                minute: 35,
                second: 19
            })
        );
    }

    #[test]
    fn test_gnss_talker_is_accepted() {
        let mut gps = NmeaPositionSource::new();
        gps.feed(b"$GNRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*74\r\n");
        assert!(gps.poll().valid);
    }

    #[test]
    fn test_void_status_invalidates_fix() {
        let mut gps = NmeaPositionSource::new();
        gps.feed(RMC_VALID.as_bytes());
        gps.feed(RMC_VOID.as_bytes());
        assert!(gps.poll().location().is_none());
    }

    #[test]
    fn test_bad_checksum_is_ignored() {
        let mut gps = NmeaPositionSource::new();
        gps.feed(RMC_VALID.replace("*6A", "*00").as_bytes());
        assert!(!gps.poll().valid);
        assert_eq!(gps.sentences(), 0);
        assert_eq!(gps.rejected(), 1);
    }

    #[test]
    fn test_sentence_split_across_feeds() {
        let mut gps = NmeaPositionSource::new();
        let (first, second) = RMC_VALID.split_at(20);
        gps.feed(first.as_bytes());
        assert!(!gps.poll().valid);
        gps.feed(second.as_bytes());
        assert!(gps.poll().valid);
        assert_eq!(gps.sentences(), 1);
    }
}
