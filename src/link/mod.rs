//! Radio link session between the sensor node and the gateway
//!
//! Delivery is at-most-once: every event gets a fresh sequence number, the
//! receiver acknowledges every decodable event, and nothing is ever resent.

pub mod radio;
pub mod session;

pub use radio::*;
pub use session::*;
