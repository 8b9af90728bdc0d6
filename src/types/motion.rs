use serde::{Deserialize, Serialize};

/// One accelerometer reading in g-units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccelSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl AccelSample {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm of the three axes; about 1.0 g when the sensor is at rest
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Instantaneous motion classification of a single sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionState {
    Moving,
    Stationary,
}

impl MotionState {
    pub fn is_stationary(&self) -> bool {
        matches!(self, MotionState::Stationary)
    }
}

impl std::fmt::Display for MotionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MotionState::Moving => f.write_str("MOVING"),
            MotionState::Stationary => f.write_str("STATIONARY"),
        }
    }
}
