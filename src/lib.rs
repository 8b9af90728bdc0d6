//! Pole Telemetry Library
//!
//! Telemetry protocol and event detection for a pole-mounted sensor network.
//! A ball-borne sensor node reports clog-candidate events over a packet radio
//! to a pole gateway, which multiplexes them with environmental readings onto a
//! serial line read by a camera/uplink node.
//!
//! # Features
//!
//! - **`csv`** (default): Enable CSV export of demultiplexed serial records
//! - **`cli`** (default): Build the command-line interface binary
//!
//! # Quick Start
//!
//! Decode a radio packet and forward it as a serial record:
//! ```rust
//! use pole_telemetry::{decode_payload, encode_record, GpsRecord, RadioPayload, TaggedRecord};
//!
//! let payload = decode_payload("7|123456|6.927079|79.861244").unwrap();
//! assert_eq!(payload.sequence(), Some(7));
//!
//! let line = encode_record(&TaggedRecord::Gps(GpsRecord::from(&payload))).unwrap();
//! assert_eq!(line, r#"GPS:{"latitude":6.927079,"longitude":79.861244}"#);
//!
//! assert_eq!(decode_payload("GPS data not available").unwrap(), RadioPayload::NoFix);
//! ```
//!
//! Run a sensor node against a gateway over an in-memory radio:
//! ```rust
//! use pole_telemetry::{AccelSample, BallNode, LinkReceiver, LoopbackRadio, MotionConfig, PositionFix, Reception};
//!
//! let (ball_radio, pole_radio) = LoopbackRadio::pair("ball", "pole");
//! let mut ball = BallNode::start(ball_radio, MotionConfig::default()).unwrap();
//! let mut pole = LinkReceiver::new(pole_radio);
//!
//! let fix = PositionFix::at(6.927079, 79.861244);
//! let at_rest = AccelSample::new(0.0, 0.0, 1.0);
//! ball.tick(0, at_rest, &fix).unwrap();
//! let tick = ball.tick(5_000, at_rest, &fix).unwrap();
//! assert!(tick.alert.is_some());
//! assert!(matches!(pole.poll(), Some(Reception::Delivered(_))));
//! ```
//!
//! # Public API
//!
//! ## Codecs
//! - [`encode_event`] / [`decode_payload`] - Radio event wire format and the no-fix sentinel
//! - [`encode_ack`] / [`decode_ack`] - Acknowledgment format
//! - [`encode_record`] / [`decode_line`] - Tagged serial line format
//!
//! ## Link and Detection
//! - [`LinkSender`] / [`LinkReceiver`] - Sequence numbering, ACKs and deduplication
//! - [`classify`] - Motion classification of one accelerometer sample
//! - [`EventTrigger`] - At most one alert per stationary episode
//!
//! ## Serial and Uplink
//! - [`SerialMultiplexer`] / [`SerialDemultiplexer`] - Stream tagging and dispatch
//! - [`ClogConfirmer`] - Dark-pixel clog confirmation
//! - [`UploadSink`] / [`FileUploadSink`] - Upload collaborator and its local mirror
//!
//! ## Nodes
//! - [`BallNode`], [`GatewayNode`], [`UplinkNode`] - The three node loops
//! - [`Scheduler`] - Cooperative periodic jobs
//!
//! ## Conversion Utilities
//! - [`accel_counts_to_g`] - Raw accelerometer counts to g
//! - [`convert_knots_to_kmph`] - Ground speed from RMC knots to km/h
//! - [`format_coordinate`] - Fixed six-decimal coordinate text

// Module declarations
pub mod codec;
pub mod config;
pub mod confirm;
pub mod conversion;
pub mod detection;
pub mod error;
#[cfg(feature = "csv")]
pub mod export;
pub mod link;
pub mod mux;
pub mod node;
pub mod position;
pub mod scheduler;
pub mod types;
pub mod upload;

// Re-export everything from modules for convenience
pub use codec::*;
pub use config::*;
pub use confirm::*;
pub use conversion::*;
pub use detection::*;
pub use error::*;
#[cfg(feature = "csv")]
pub use export::*;
pub use link::*;
pub use mux::*;
pub use node::*;
pub use position::*;
pub use scheduler::*;
pub use types::*;
pub use upload::*;
