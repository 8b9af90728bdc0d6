use crate::codec::{decode_ack, decode_payload, encode_ack, encode_event, encode_payload};
use crate::error::{Result, TelemetryError};
use crate::link::radio::Radio;
use crate::types::{AckPacket, EventPacket, RadioPayload};
use log::{debug, info, warn};

/// Sending half of the link, owned by the sensor node
///
/// Sequence numbers start at 0 and wrap at 2^16. ACKs are never awaited; the
/// caller polls for them opportunistically between samples.
#[derive(Debug)]
pub struct LinkSender<R: Radio> {
    radio: R,
    next_sequence: u16,
    awaiting_ack: Option<u16>,
    acked: u32,
}

impl<R: Radio> LinkSender<R> {
    pub fn new(radio: R) -> Self {
        Self {
            radio,
            next_sequence: 0,
            awaiting_ack: None,
            acked: 0,
        }
    }

    /// Sequence number the next event will carry
    pub fn next_sequence(&self) -> u16 {
        self.next_sequence
    }

    /// Sequence of the last event sent, while its ACK has not been seen
    pub fn awaiting_ack(&self) -> Option<u16> {
        self.awaiting_ack
    }

    pub fn acked(&self) -> u32 {
        self.acked
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    /// Transmit one event with the next sequence number
    ///
    /// The counter advances even if the radio reports an error, so a sequence
    /// value is never reused for a second attempt.
    pub fn send_event(&mut self, timestamp_ms: u32, latitude: f64, longitude: f64) -> Result<EventPacket> {
        let packet = EventPacket {
            sequence: self.next_sequence,
            timestamp_ms,
            latitude,
            longitude,
        };
        self.next_sequence = self.next_sequence.wrapping_add(1);

        let payload = encode_event(&packet);
        self.radio.transmit(&payload)?;
        self.awaiting_ack = Some(packet.sequence);
        info!("Radio sent: {}", payload);
        Ok(packet)
    }

    /// Tell the gateway an alert fired without a usable position
    pub fn send_no_fix(&mut self) -> Result<()> {
        let payload = encode_payload(&RadioPayload::NoFix);
        self.radio.transmit(&payload)?;
        info!("Radio sent: {}", payload);
        Ok(())
    }

    /// Check for at most one inbound ACK without blocking
    ///
    /// Returns the ACK when it matches the outstanding event. Stale ACKs and
    /// non-ACK traffic are logged and dropped.
    pub fn poll_ack(&mut self) -> Option<AckPacket> {
        let payload = self.radio.try_receive()?;
        match decode_ack(&payload) {
            Ok(ack) if Some(ack.sequence) == self.awaiting_ack => {
                self.awaiting_ack = None;
                self.acked += 1;
                debug!("ACK received for sequence {}", ack.sequence);
                Some(ack)
            }
            Ok(ack) => {
                debug!(
                    "Ignoring ACK for sequence {} (awaiting {:?})",
                    ack.sequence, self.awaiting_ack
                );
                None
            }
            Err(e) => {
                debug!("Ignoring non-ACK radio traffic: {}", e);
                None
            }
        }
    }
}

/// Last accepted event sequence on the receiving node
///
/// Only exact equality counts as a duplicate; no modular ordering is applied,
/// so 65535 followed by 0 is novel. The window starts empty, so the very first
/// packet is always novel whatever its sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupWindow {
    last_seen_sequence: Option<u16>,
}

impl DedupWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_seen_sequence(&self) -> Option<u16> {
        self.last_seen_sequence
    }

    pub fn is_duplicate(&self, sequence: u16) -> bool {
        self.last_seen_sequence == Some(sequence)
    }

    /// Record `sequence`; returns false when it was a duplicate
    pub fn accept(&mut self, sequence: u16) -> bool {
        if self.is_duplicate(sequence) {
            return false;
        }
        self.last_seen_sequence = Some(sequence);
        true
    }
}

/// What became of one inbound radio packet
#[derive(Debug)]
pub enum Reception {
    /// New information to forward downstream (event or no-fix notice)
    Delivered(RadioPayload),
    /// Event already seen; acknowledged again but not forwarded
    Duplicate { sequence: u16 },
    /// Payload did not decode; not acknowledged, not forwarded
    Rejected(TelemetryError),
}

/// Counters kept by the receiving side
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LinkStats {
    pub received: u32,
    pub delivered: u32,
    pub duplicates: u32,
    pub rejected: u32,
    pub acks_sent: u32,
    pub ack_failures: u32,
}

/// Receiving half of the link, owned by the gateway
#[derive(Debug)]
pub struct LinkReceiver<R: Radio> {
    radio: R,
    window: DedupWindow,
    latest_payload: Option<String>,
    stats: LinkStats,
}

impl<R: Radio> LinkReceiver<R> {
    pub fn new(radio: R) -> Self {
        Self {
            radio,
            window: DedupWindow::new(),
            latest_payload: None,
            stats: LinkStats::default(),
        }
    }

    pub fn window(&self) -> &DedupWindow {
        &self.window
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Raw text of the most recent packet heard, even if it was rejected
    pub fn latest_payload(&self) -> Option<&str> {
        self.latest_payload.as_deref()
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    /// Take at most one pending packet off the radio and process it
    pub fn poll(&mut self) -> Option<Reception> {
        let payload = self.radio.try_receive()?;
        Some(self.handle_payload(&payload))
    }

    /// Decode, acknowledge and deduplicate one inbound payload
    ///
    /// Every decodable event is acknowledged, duplicates included. The no-fix
    /// notice carries no sequence, so it is neither acknowledged nor checked
    /// against the dedup window and is always forwarded.
    pub fn handle_payload(&mut self, payload: &str) -> Reception {
        self.stats.received += 1;
        debug!("Radio received: {}", payload);

        let decoded = decode_payload(payload);
        // The display shows the last message heard, malformed ones included
        self.latest_payload = Some(payload.trim().to_string());

        let packet = match decoded {
            Ok(RadioPayload::NoFix) => {
                info!("Sensor node reports no position fix");
                self.stats.delivered += 1;
                return Reception::Delivered(RadioPayload::NoFix);
            }
            Ok(RadioPayload::Event(packet)) => packet,
            Err(e) => {
                warn!("Dropping radio packet: {}", e);
                self.stats.rejected += 1;
                return Reception::Rejected(e);
            }
        };

        self.send_ack(packet.sequence);

        if !self.window.accept(packet.sequence) {
            debug!("Duplicate sequence {}, not forwarding", packet.sequence);
            self.stats.duplicates += 1;
            return Reception::Duplicate {
                sequence: packet.sequence,
            };
        }

        self.stats.delivered += 1;
        Reception::Delivered(RadioPayload::Event(packet))
    }

    fn send_ack(&mut self, sequence: u16) {
        let ack = encode_ack(&AckPacket { sequence });
        match self.radio.transmit(&ack) {
            Ok(()) => {
                self.stats.acks_sent += 1;
                debug!("Sent {}", ack);
            }
            Err(e) => {
                // The sender never waits for it; losing an ACK changes nothing here
                warn!("Failed to send {}: {}", ack, e);
                self.stats.ack_failures += 1;
            }
        }
    }
}
