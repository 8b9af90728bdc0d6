//! Radio wire format
//!
//! Event packets travel as `<seq>|<timestamp_ms>|<lat>|<lon>` with coordinates
//! at six decimal places. Acknowledgments are `ACK:<seq>`. A sender without a
//! position fix transmits the literal [`NO_FIX_SENTINEL`] instead.

use crate::conversion::format_coordinate;
use crate::error::{Result, TelemetryError};
use crate::types::{AckPacket, EventPacket, RadioPayload};

pub const FIELD_DELIMITER: char = '|';
pub const EVENT_FIELD_COUNT: usize = 4;
pub const ACK_PREFIX: &str = "ACK:";
pub const NO_FIX_SENTINEL: &str = "GPS data not available";

/// Encode an event packet into its delimited text form
pub fn encode_event(packet: &EventPacket) -> String {
    format!(
        "{}{d}{}{d}{}{d}{}",
        packet.sequence,
        packet.timestamp_ms,
        format_coordinate(packet.latitude),
        format_coordinate(packet.longitude),
        d = FIELD_DELIMITER
    )
}

/// Encode any radio payload
pub fn encode_payload(payload: &RadioPayload) -> String {
    match payload {
        RadioPayload::Event(packet) => encode_event(packet),
        RadioPayload::NoFix => NO_FIX_SENTINEL.to_string(),
    }
}

fn parse_field<T: std::str::FromStr>(raw: &str, name: &str, payload: &str) -> Result<T> {
    raw.trim().parse::<T>().map_err(|_| {
        TelemetryError::MalformedPacket(format!("invalid {} '{}' in '{}'", name, raw, payload))
    })
}

fn parse_coordinate(raw: &str, name: &str, payload: &str) -> Result<f64> {
    let value: f64 = parse_field(raw, name, payload)?;
    if !value.is_finite() {
        return Err(TelemetryError::MalformedPacket(format!(
            "non-finite {} '{}' in '{}'",
            name, raw, payload
        )));
    }
    Ok(value)
}

/// Decode an inbound radio payload
///
/// The no-fix sentinel decodes to [`RadioPayload::NoFix`] without any numeric
/// parsing. Everything else must carry exactly four parseable fields; extra
/// delimiters end up in the longitude field and fail there.
pub fn decode_payload(payload: &str) -> Result<RadioPayload> {
    let payload = payload.trim();

    if payload.starts_with(NO_FIX_SENTINEL) {
        return Ok(RadioPayload::NoFix);
    }

    let fields: Vec<&str> = payload.splitn(EVENT_FIELD_COUNT, FIELD_DELIMITER).collect();
    if fields.len() < EVENT_FIELD_COUNT {
        return Err(TelemetryError::MalformedPacket(format!(
            "expected {} '{}'-delimited fields, found {} in '{}'",
            EVENT_FIELD_COUNT,
            FIELD_DELIMITER,
            fields.len(),
            payload
        )));
    }

    Ok(RadioPayload::Event(EventPacket {
        sequence: parse_field(fields[0], "sequence", payload)?,
        timestamp_ms: parse_field(fields[1], "timestamp", payload)?,
        latitude: parse_coordinate(fields[2], "latitude", payload)?,
        longitude: parse_coordinate(fields[3], "longitude", payload)?,
    }))
}

pub fn encode_ack(ack: &AckPacket) -> String {
    format!("{}{}", ACK_PREFIX, ack.sequence)
}

/// Decode an acknowledgment; the literal `ACK:` prefix is mandatory
pub fn decode_ack(payload: &str) -> Result<AckPacket> {
    let payload = payload.trim();
    let digits = payload.strip_prefix(ACK_PREFIX).ok_or_else(|| {
        TelemetryError::MalformedPacket(format!("missing '{}' prefix in '{}'", ACK_PREFIX, payload))
    })?;

    Ok(AckPacket {
        sequence: parse_field(digits, "acknowledged sequence", payload)?,
    })
}
