use serde::{Deserialize, Serialize};

/// UTC time of day reported with a satellite fix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UtcTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// Satellite-navigation fix as seen by the sensor node
///
/// Every field other than `valid` is meaningless while `valid` is false.
/// Callers go through [`PositionFix::location`] so an invalid fix is never read.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PositionFix {
    pub valid: bool,
    pub latitude: f64,
    pub longitude: f64,
    /// Ground speed in km/h
    pub speed_kmph: f64,
    pub time: Option<UtcTime>,
}

impl PositionFix {
    pub fn invalid() -> Self {
        Self::default()
    }

    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            valid: true,
            latitude,
            longitude,
            speed_kmph: 0.0,
            time: None,
        }
    }

    /// Latitude/longitude pair, only when the fix is valid
    pub fn location(&self) -> Option<(f64, f64)> {
        if self.valid {
            Some((self.latitude, self.longitude))
        } else {
            None
        }
    }

    pub fn speed(&self) -> Option<f64> {
        self.valid.then_some(self.speed_kmph)
    }
}
