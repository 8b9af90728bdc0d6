//! Unit conversion helpers for raw sensor values
//!
//! Only the conversions the telemetry core depends on live here. Calibration
//! curves for the environmental sensors belong to the sensor drivers.

use crate::types::{AccelSample, SensorValue};

/// MPU-6050 sensitivity at the default +/-2 g full-scale range (LSB per g)
pub const ACCEL_COUNTS_PER_G: f32 = 16384.0;

/// Knots to km/h, as reported by RMC sentences
pub const KNOTS_TO_KMPH: f64 = 1.852;

/// Convert a raw accelerometer register value to g-units
pub fn accel_counts_to_g(raw_value: i16) -> f32 {
    raw_value as f32 / ACCEL_COUNTS_PER_G
}

impl AccelSample {
    /// Build a sample from the three raw accelerometer registers
    pub fn from_raw_counts(ax: i16, ay: i16, az: i16) -> Self {
        Self::new(
            accel_counts_to_g(ax),
            accel_counts_to_g(ay),
            accel_counts_to_g(az),
        )
    }
}

/// Convert knots to km/h
pub fn convert_knots_to_kmph(knots: f64) -> f64 {
    knots * KNOTS_TO_KMPH
}

/// Format a coordinate with the fixed six decimal places used on the radio
pub fn format_coordinate(value: f64) -> String {
    format!("{:.6}", value)
}

/// Sanitize a raw sensor driver value at the encoding boundary
pub fn sanitize_reading(raw_value: f32) -> SensorValue {
    SensorValue::from_reading(raw_value)
}
