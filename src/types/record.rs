use crate::types::packet::RadioPayload;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Marker written in place of a sensor value that could not be read
pub const UNAVAILABLE_PLACEHOLDER: &str = "N/A";

/// Logical stream a serial line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamTag {
    Env,
    Gps,
}

impl StreamTag {
    pub const ALL: [StreamTag; 2] = [StreamTag::Env, StreamTag::Gps];

    /// Literal prefix that opens every line of this stream
    pub fn prefix(&self) -> &'static str {
        match self {
            StreamTag::Env => "ENV:",
            StreamTag::Gps => "GPS:",
        }
    }

    /// Split a line into its tag and the payload following the prefix
    pub fn split_line(line: &str) -> Option<(StreamTag, &str)> {
        Self::ALL
            .iter()
            .find_map(|tag| line.strip_prefix(tag.prefix()).map(|rest| (*tag, rest)))
    }
}

/// Physical sensor reading, or the fact that the sensor returned nothing usable
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SensorValue {
    Reading(f32),
    #[default]
    Unavailable,
}

impl SensorValue {
    /// Wrap a raw driver value; NaN and infinities mean the sensor is unavailable
    pub fn from_reading(value: f32) -> Self {
        if value.is_finite() {
            SensorValue::Reading(value)
        } else {
            SensorValue::Unavailable
        }
    }

    pub fn value(&self) -> Option<f32> {
        match self {
            SensorValue::Reading(v) => Some(*v),
            SensorValue::Unavailable => None,
        }
    }
}

impl From<f32> for SensorValue {
    fn from(value: f32) -> Self {
        SensorValue::from_reading(value)
    }
}

impl std::fmt::Display for SensorValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorValue::Reading(v) => write!(f, "{:.1}", v),
            SensorValue::Unavailable => f.write_str(UNAVAILABLE_PLACEHOLDER),
        }
    }
}

/// f32 to f64 through the shortest decimal text, so 28.44 stays 28.44
/// instead of picking up 28.440000534057617 when held as a JSON value
fn widen(value: f32) -> f64 {
    value.to_string().parse().unwrap_or(value as f64)
}

impl Serialize for SensorValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            SensorValue::Reading(v) => serializer.serialize_f64(widen(*v)),
            SensorValue::Unavailable => serializer.serialize_str(UNAVAILABLE_PLACEHOLDER),
        }
    }
}

impl<'de> Deserialize<'de> for SensorValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Number(f64),
            Text(String),
            Null(()),
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Number(v) => SensorValue::from_reading(v as f32),
            Wire::Text(_) | Wire::Null(()) => SensorValue::Unavailable,
        })
    }
}

/// Environmental readings sampled on the gateway
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnvReading {
    #[serde(default)]
    pub temperature: SensorValue,
    #[serde(default)]
    pub humidity: SensorValue,
    #[serde(default)]
    pub air_quality: SensorValue,
    #[serde(default)]
    pub noise_level: SensorValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GpsStatus {
    #[serde(rename = "no_data")]
    NoData,
}

/// Positional record forwarded over the serial link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GpsRecord {
    Position { latitude: f64, longitude: f64 },
    Status { status: GpsStatus },
}

impl GpsRecord {
    pub fn no_data() -> Self {
        GpsRecord::Status {
            status: GpsStatus::NoData,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, GpsRecord::Status { .. })
    }
}

impl From<&RadioPayload> for GpsRecord {
    fn from(payload: &RadioPayload) -> Self {
        match payload {
            RadioPayload::Event(packet) => GpsRecord::Position {
                latitude: packet.latitude,
                longitude: packet.longitude,
            },
            RadioPayload::NoFix => GpsRecord::no_data(),
        }
    }
}

/// One record crossing the serial boundary; the payload shape follows the tag
#[derive(Debug, Clone, PartialEq)]
pub enum TaggedRecord {
    Env(EnvReading),
    Gps(GpsRecord),
}

impl TaggedRecord {
    pub fn tag(&self) -> StreamTag {
        match self {
            TaggedRecord::Env(_) => StreamTag::Env,
            TaggedRecord::Gps(_) => StreamTag::Gps,
        }
    }
}
