//! The three node roles of the pole network
//!
//! - [`ball`]: samples motion and position, raises clog-candidate alerts over radio
//! - [`gateway`]: receives alerts, samples the environment, multiplexes both onto serial
//! - [`uplink`]: consumes the serial stream, uploads records, confirms clogs visually

pub mod ball;
pub mod gateway;
pub mod uplink;

pub use ball::*;
pub use gateway::*;
pub use uplink::*;
