use crate::types::MotionState;
use log::debug;

/// Where the trigger stands in the current stationary episode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    Moving,
    /// Stationary, dwell timer running
    StationaryPending { since_ms: u64 },
    /// Stationary and the alert for this episode has already fired
    StationaryFired { since_ms: u64 },
}

/// Turns motion observations into at most one "stopped" alert per stationary episode
///
/// Any moving observation re-arms the trigger for the next episode.
#[derive(Debug, Clone)]
pub struct EventTrigger {
    stationary_threshold_ms: u64,
    state: TriggerState,
    fired_count: u64,
}

impl EventTrigger {
    pub fn new(stationary_threshold_ms: u64) -> Self {
        Self {
            stationary_threshold_ms,
            state: TriggerState::Moving,
            fired_count: 0,
        }
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    /// Start of the current stationary episode, if any
    pub fn stationary_since(&self) -> Option<u64> {
        match self.state {
            TriggerState::Moving => None,
            TriggerState::StationaryPending { since_ms }
            | TriggerState::StationaryFired { since_ms } => Some(since_ms),
        }
    }

    /// Total alerts fired since construction
    pub fn fired_count(&self) -> u64 {
        self.fired_count
    }

    /// Feed one observation; returns true exactly when the caller must send the alert
    pub fn observe(&mut self, motion: MotionState, now_ms: u64) -> bool {
        if motion == MotionState::Moving {
            if self.state != TriggerState::Moving {
                debug!("Motion resumed, trigger re-armed");
            }
            self.state = TriggerState::Moving;
            return false;
        }

        let since_ms = match self.state {
            TriggerState::Moving => {
                debug!("Stationary episode started at {} ms", now_ms);
                self.state = TriggerState::StationaryPending { since_ms: now_ms };
                now_ms
            }
            TriggerState::StationaryPending { since_ms } => since_ms,
            TriggerState::StationaryFired { .. } => return false,
        };

        if now_ms.saturating_sub(since_ms) >= self.stationary_threshold_ms {
            self.state = TriggerState::StationaryFired { since_ms };
            self.fired_count += 1;
            debug!(
                "Stationary for {} ms, firing clog-candidate alert",
                now_ms.saturating_sub(since_ms)
            );
            return true;
        }

        false
    }
}
