use crate::types::{AccelSample, MotionState};

/// Acceleration magnitude of a sensor at rest, in g
pub const REST_MAGNITUDE_G: f32 = 1.0;

/// Classify one sample as moving or stationary
///
/// The sample is stationary when its magnitude lies strictly within
/// `threshold` of 1 g. Samples right at the boundary flap between states on
/// floating-point noise; the event trigger's dwell timer absorbs that.
pub fn classify(sample: &AccelSample, threshold: f32) -> MotionState {
    if (sample.magnitude() - REST_MAGNITUDE_G).abs() < threshold {
        MotionState::Stationary
    } else {
        MotionState::Moving
    }
}
