//! Pole gateway: radio receiver, environmental sampler and serial forwarder
//!
//! Each [`GatewayNode::tick`] takes at most one packet off the radio, forwards
//! anything new to the serial line as a `GPS:` record, then lets the scheduler
//! run at most one periodic job (environmental upload or display rotation).

use crate::config::GatewayConfig;
use crate::error::Result;
use crate::link::{LinkReceiver, Radio, Reception};
use crate::mux::SerialMultiplexer;
use crate::scheduler::{PeriodicTask, Scheduler};
use crate::types::{EnvReading, GpsRecord, SensorValue, TaggedRecord};
use log::{debug, info, warn};
use std::collections::VecDeque;
use std::io::Write;

/// Characters that fit on one line of the 16x2 character display
pub const DISPLAY_WIDTH: usize = 16;

/// Environmental sensors, already converted to physical units
pub trait EnvironmentSource {
    fn read(&mut self, now_ms: u64) -> EnvReading;
}

/// Reports the same reading every time
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedEnvironment(pub EnvReading);

impl EnvironmentSource for FixedEnvironment {
    fn read(&mut self, _now_ms: u64) -> EnvReading {
        self.0
    }
}

/// Plays back recorded readings, then keeps repeating the last one
#[derive(Debug, Clone, Default)]
pub struct ReplayEnvironment {
    readings: VecDeque<EnvReading>,
    last: EnvReading,
}

impl ReplayEnvironment {
    pub fn new(readings: impl IntoIterator<Item = EnvReading>) -> Self {
        Self {
            readings: readings.into_iter().collect(),
            last: EnvReading::default(),
        }
    }
}

impl EnvironmentSource for ReplayEnvironment {
    fn read(&mut self, _now_ms: u64) -> EnvReading {
        if let Some(next) = self.readings.pop_front() {
            self.last = next;
        }
        self.last
    }
}

/// Pages shown in rotation on the gateway display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayPage {
    TempHumidity,
    AirQuality,
    NoiseLevel,
    Coordinates,
    Summary,
}

impl DisplayPage {
    pub const ALL: [DisplayPage; 5] = [
        DisplayPage::TempHumidity,
        DisplayPage::AirQuality,
        DisplayPage::NoiseLevel,
        DisplayPage::Coordinates,
        DisplayPage::Summary,
    ];

    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

/// Two lines of text for the character display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplaySnapshot {
    pub page: DisplayPage,
    pub lines: [String; 2],
}

/// Character display collaborator
pub trait CharacterDisplay {
    fn show(&mut self, snapshot: &DisplaySnapshot);
}

/// Writes each page to the log instead of a panel
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDisplay;

impl CharacterDisplay for LogDisplay {
    fn show(&mut self, snapshot: &DisplaySnapshot) {
        debug!("Display [{}] [{}]", snapshot.lines[0], snapshot.lines[1]);
    }
}

fn whole(value: SensorValue) -> String {
    match value.value() {
        Some(v) => format!("{}", v.trunc() as i64),
        None => value.to_string(),
    }
}

fn rounded(value: SensorValue) -> String {
    match value.value() {
        Some(v) => format!("{:.0}", v),
        None => value.to_string(),
    }
}

fn verdict(value: SensorValue, good: impl Fn(f32) -> bool, yes: &str, no: &str) -> String {
    match value.value() {
        Some(v) if good(v) => yes.to_string(),
        Some(_) => no.to_string(),
        None => value.to_string(),
    }
}

/// Text for one display page
pub fn render_page(page: DisplayPage, env: &EnvReading, latest_message: Option<&str>) -> DisplaySnapshot {
    let lines = match page {
        DisplayPage::TempHumidity => [
            format!("Temp: {}C", env.temperature),
            format!("Hum: {}%", env.humidity),
        ],
        DisplayPage::AirQuality => [
            format!("Air: {}", rounded(env.air_quality)),
            verdict(env.air_quality, |v| v < 50.0, "Good", "Poor"),
        ],
        DisplayPage::NoiseLevel => [
            format!("Noise: {} dB", whole(env.noise_level)),
            verdict(env.noise_level, |v| v > 70.0, "Loud", "Quiet"),
        ],
        DisplayPage::Coordinates => match latest_message {
            Some(message) => ["Msg:".to_string(), message.chars().take(DISPLAY_WIDTH).collect()],
            None => ["No LoRa Msg".to_string(), String::new()],
        },
        DisplayPage::Summary => [
            format!("T:{}C AQ:{}", env.temperature, rounded(env.air_quality)),
            format!("N:{}dB", whole(env.noise_level)),
        ],
    };
    DisplaySnapshot { page, lines }
}

/// State the periodic jobs operate on
pub struct GatewayState<R: Radio, W: Write> {
    pub receiver: LinkReceiver<R>,
    pub mux: SerialMultiplexer<W>,
    environment: Box<dyn EnvironmentSource>,
    display: Box<dyn CharacterDisplay>,
    latest_env: EnvReading,
    page: DisplayPage,
}

impl<R: Radio, W: Write> GatewayState<R, W> {
    pub fn latest_env(&self) -> &EnvReading {
        &self.latest_env
    }

    pub fn page(&self) -> DisplayPage {
        self.page
    }
}

fn send_environmental<R: Radio, W: Write>(state: &mut GatewayState<R, W>, now_ms: u64) -> Result<()> {
    let reading = state.environment.read(now_ms);
    state.latest_env = reading;
    state.mux.send(&TaggedRecord::Env(reading))?;
    info!("Environmental data sent");
    Ok(())
}

fn rotate_display<R: Radio, W: Write>(state: &mut GatewayState<R, W>, _now_ms: u64) -> Result<()> {
    state.page = state.page.next();
    let snapshot = render_page(state.page, &state.latest_env, state.receiver.latest_payload());
    state.display.show(&snapshot);
    Ok(())
}

/// Result of one gateway loop pass
#[derive(Debug)]
pub struct GatewayTick {
    pub reception: Option<Reception>,
    /// Periodic job that ran this pass
    pub task: Option<&'static str>,
}

pub struct GatewayNode<R: Radio, W: Write> {
    config: GatewayConfig,
    scheduler: Scheduler<GatewayState<R, W>>,
    state: GatewayState<R, W>,
}

impl<R: Radio, W: Write> GatewayNode<R, W> {
    /// Bring the radio up and register the periodic jobs
    pub fn start(
        mut radio: R,
        serial: W,
        environment: Box<dyn EnvironmentSource>,
        display: Box<dyn CharacterDisplay>,
        config: GatewayConfig,
    ) -> Result<Self> {
        radio.begin()?;
        info!("LoRa receiver ready");

        let mut scheduler = Scheduler::new();
        scheduler
            .add(PeriodicTask::new(
                "environmental",
                config.env_interval_ms,
                send_environmental::<R, W>,
            ))
            .add(PeriodicTask::new(
                "display",
                config.display_interval_ms,
                rotate_display::<R, W>,
            ));

        Ok(Self {
            config,
            scheduler,
            state: GatewayState {
                receiver: LinkReceiver::new(radio),
                mux: SerialMultiplexer::new(serial),
                environment,
                display,
                latest_env: EnvReading::default(),
                page: DisplayPage::TempHumidity,
            },
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn state(&self) -> &GatewayState<R, W> {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GatewayState<R, W> {
        &mut self.state
    }

    pub fn into_serial(self) -> W {
        self.state.mux.into_inner()
    }

    /// One pass of the gateway loop
    ///
    /// Fails only when the serial line cannot be written; radio and job
    /// failures are logged and the loop goes on.
    pub fn tick(&mut self, now_ms: u64) -> Result<GatewayTick> {
        let reception = self.state.receiver.poll();
        if let Some(Reception::Delivered(payload)) = &reception {
            self.state.mux.send(&TaggedRecord::Gps(GpsRecord::from(payload)))?;
        }

        let task = self.scheduler.poll(&mut self.state, now_ms).map(|run| {
            if let Err(e) = run.result {
                warn!("Periodic job '{}' failed: {}", run.name, e);
            }
            run.name
        });

        Ok(GatewayTick { reception, task })
    }
}
