//! Serial line format shared by the gateway and the uplink node
//!
//! Each record is one line: a stream tag (`ENV:` or `GPS:`) followed by a JSON
//! object. Lines without a known tag are not records (the same wire also
//! carries human-readable status chatter) and are skipped by the decoder.

use crate::error::{Result, TelemetryError};
use crate::types::{EnvReading, GpsRecord, StreamTag, TaggedRecord};

/// Serialize a record to a single tagged line, without the trailing newline
pub fn encode_record(record: &TaggedRecord) -> Result<String> {
    let body = match record {
        TaggedRecord::Env(reading) => serde_json::to_string(reading)?,
        TaggedRecord::Gps(gps) => serde_json::to_string(gps)?,
    };
    Ok(format!("{}{}", record.tag().prefix(), body))
}

/// Parse one serial line
///
/// Returns `Ok(None)` for lines that carry no recognized stream tag and
/// `Err(MalformedRecord)` when the tag is known but the payload does not parse.
pub fn decode_line(line: &str) -> Result<Option<TaggedRecord>> {
    let line = line.trim();
    let Some((tag, body)) = StreamTag::split_line(line) else {
        return Ok(None);
    };

    let malformed =
        |reason: String| TelemetryError::MalformedRecord(format!("{}{} ({})", tag.prefix(), body, reason));

    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| malformed(e.to_string()))?;
    if !value.is_object() {
        return Err(malformed("payload is not a JSON object".to_string()));
    }

    let record = match tag {
        StreamTag::Env => serde_json::from_value::<EnvReading>(value).map(TaggedRecord::Env),
        StreamTag::Gps => serde_json::from_value::<GpsRecord>(value).map(TaggedRecord::Gps),
    };

    record.map(Some).map_err(|e| malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SensorValue;

    #[test]
    fn test_encode_env_line() {
        let record = TaggedRecord::Env(EnvReading {
            temperature: SensorValue::Reading(21.5),
            humidity: SensorValue::Reading(60.0),
            air_quality: SensorValue::Unavailable,
            noise_level: SensorValue::Reading(48.25),
        });
        assert_eq!(
            encode_record(&record).unwrap(),
            r#"ENV:{"temperature":21.5,"humidity":60.0,"air_quality":"N/A","noise_level":48.25}"#
        );
    }

    #[test]
    fn test_encode_gps_lines() {
        let position = TaggedRecord::Gps(GpsRecord::Position {
            latitude: 6.927079,
            longitude: 79.861244,
        });
        assert_eq!(
            encode_record(&position).unwrap(),
            r#"GPS:{"latitude":6.927079,"longitude":79.861244}"#
        );
        assert_eq!(
            encode_record(&TaggedRecord::Gps(GpsRecord::no_data())).unwrap(),
            r#"GPS:{"status":"no_data"}"#
        );
    }

    #[test]
    fn test_decode_line_dispatch_shapes() {
        let env = decode_line(r#"ENV:{"temperature":21.5,"humidity":60,"air_quality":12,"noise_level":40}"#)
            .unwrap()
            .unwrap();
        assert_eq!(env.tag(), StreamTag::Env);

        let gps = decode_line("GPS:{\"status\":\"no_data\"}\r").unwrap().unwrap();
        assert_eq!(gps, TaggedRecord::Gps(GpsRecord::no_data()));
    }

    #[test]
    fn test_decode_line_skips_untagged_chatter() {
        assert!(decode_line("Environmental data sent.").unwrap().is_none());
        assert!(decode_line("").unwrap().is_none());
        assert!(decode_line("TMP:{\"temperature\":1}").unwrap().is_none());
    }

    #[test]
    fn test_decode_line_reports_bad_payload() {
        for bad in ["ENV:{\"temperature\":", "GPS:{}", "GPS:not json", "ENV:[1,2]"] {
            assert!(
                matches!(decode_line(bad), Err(TelemetryError::MalformedRecord(_))),
                "'{bad}' should be malformed"
            );
        }
    }
}
