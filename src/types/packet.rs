/// Clog-candidate report sent from the sensor node over the radio
#[derive(Debug, Clone, PartialEq)]
pub struct EventPacket {
    /// Per-sender transmission counter, wraps at 2^16
    pub sequence: u16,
    /// Device-local monotonic milliseconds at send time
    pub timestamp_ms: u32,
    pub latitude: f64,
    pub longitude: f64,
}

/// Acknowledgment for one received event packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckPacket {
    pub sequence: u16,
}

/// Anything a sensor node may put on the air
#[derive(Debug, Clone, PartialEq)]
pub enum RadioPayload {
    Event(EventPacket),
    /// Sender had no valid position fix when the alert fired
    NoFix,
}

impl RadioPayload {
    pub fn sequence(&self) -> Option<u16> {
        match self {
            RadioPayload::Event(packet) => Some(packet.sequence),
            RadioPayload::NoFix => None,
        }
    }
}
