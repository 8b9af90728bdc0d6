//! Sensor node carried by the ball (or mounted on the pole)

use crate::config::MotionConfig;
use crate::detection::{classify, EventTrigger};
use crate::error::Result;
use crate::link::{LinkSender, Radio};
use crate::types::{AccelSample, AckPacket, EventPacket, MotionState, PositionFix};
use log::{info, warn};

/// What the sensor node put on the air after a stationary episode matured
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    Event(EventPacket),
    /// Trigger fired without a valid fix
    NoFix,
}

/// Everything one loop pass did
#[derive(Debug, Clone, PartialEq)]
pub struct BallTick {
    pub motion: MotionState,
    pub alert: Option<Alert>,
    /// Periodic position report, when one was due
    pub report: Option<EventPacket>,
    pub ack: Option<AckPacket>,
}

#[derive(Debug)]
pub struct BallNode<R: Radio> {
    config: MotionConfig,
    trigger: EventTrigger,
    sender: LinkSender<R>,
    last_report_ms: u64,
}

impl<R: Radio> BallNode<R> {
    /// Bring the radio up and arm the trigger
    ///
    /// A radio that does not come up is fatal: the node has nothing to report through.
    pub fn start(mut radio: R, config: MotionConfig) -> Result<Self> {
        radio.begin()?;
        info!(
            "Sensor node ready (threshold {} g, dwell {} ms)",
            config.accel_threshold, config.stationary_threshold_ms
        );
        Ok(Self {
            config,
            trigger: EventTrigger::new(config.stationary_threshold_ms),
            sender: LinkSender::new(radio),
            last_report_ms: 0,
        })
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    pub fn trigger(&self) -> &EventTrigger {
        &self.trigger
    }

    pub fn sender(&self) -> &LinkSender<R> {
        &self.sender
    }

    pub fn sender_mut(&mut self) -> &mut LinkSender<R> {
        &mut self.sender
    }

    /// One pass of the sensor loop
    ///
    /// The timestamp on the wire is the low 32 bits of `now_ms`, like a
    /// microcontroller millisecond counter.
    pub fn tick(&mut self, now_ms: u64, sample: AccelSample, fix: &PositionFix) -> Result<BallTick> {
        let motion = classify(&sample, self.config.accel_threshold);

        let alert = if self.trigger.observe(motion, now_ms) {
            Some(self.send_alert(now_ms, fix)?)
        } else {
            None
        };

        // A due report is dropped on a pass that already sent an alert
        let report = match self.config.report_interval_ms {
            Some(interval) if now_ms.saturating_sub(self.last_report_ms) >= interval => {
                self.last_report_ms = now_ms;
                match fix.location() {
                    _ if alert.is_some() => None,
                    Some((lat, lon)) => Some(self.sender.send_event(now_ms as u32, lat, lon)?),
                    None => None,
                }
            }
            _ => None,
        };

        let ack = self.sender.poll_ack();
        Ok(BallTick {
            motion,
            alert,
            report,
            ack,
        })
    }

    fn send_alert(&mut self, now_ms: u64, fix: &PositionFix) -> Result<Alert> {
        match fix.location() {
            Some((lat, lon)) => Ok(Alert::Event(self.sender.send_event(now_ms as u32, lat, lon)?)),
            None => {
                warn!("GPS location invalid, reporting alert without position");
                self.sender.send_no_fix()?;
                Ok(Alert::NoFix)
            }
        }
    }
}
