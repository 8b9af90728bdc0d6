//! Motion classification and clog-candidate event triggering
//!
//! The classifier is a pure function of one accelerometer sample. The trigger
//! turns the resulting stream of states into at most one alert per stationary
//! episode.

pub mod classifier;
pub mod trigger;

pub use classifier::*;
pub use trigger::*;
