//! Configuration of the simulated endpoints.

use std::time::Duration;

use minibar_domain::control::ControlRange;
use serde::Deserialize;

use crate::devices::{VirtualPump, VirtualSpeaker};

/// Speakers and pumps attached at startup.
///
/// Lists left out of the file stay empty; [`VirtualConfig::demo`] is the
/// set used when no virtual devices are configured at all.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct VirtualConfig {
    pub speakers: Vec<SpeakerConfig>,
    pub pumps: Vec<PumpConfig>,
}

impl VirtualConfig {
    /// One `Virtual Speaker` with a `[-80, 6]` dB gain and one `Virtual Pump`
    /// with a `[0, 255]` duty.
    #[must_use]
    pub fn demo() -> Self {
        Self {
            speakers: vec![SpeakerConfig {
                name: "Virtual Speaker".to_string(),
                gain_min: Some(-80.0),
                gain_max: Some(6.0),
                ..SpeakerConfig::default()
            }],
            pumps: vec![PumpConfig {
                name: "Virtual Pump".to_string(),
                duty_min: Some(0.0),
                duty_max: Some(255.0),
                ..PumpConfig::default()
            }],
        }
    }
}

/// A simulated speaker. Omitting either gain bound simulates a line
/// without a gain control.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpeakerConfig {
    pub name: String,
    pub gain_min: Option<f32>,
    pub gain_max: Option<f32>,
    /// Length of a non-repeating playback.
    pub clip_ms: u64,
}

impl Default for SpeakerConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            gain_min: None,
            gain_max: None,
            clip_ms: 1_000,
        }
    }
}

impl SpeakerConfig {
    #[must_use]
    pub fn gain(&self) -> Option<ControlRange> {
        bounds(self.gain_min, self.gain_max)
    }

    #[must_use]
    pub fn build(&self) -> VirtualSpeaker {
        VirtualSpeaker::new(&self.name)
            .with_gain(self.gain())
            .with_clip(Duration::from_millis(self.clip_ms))
    }
}

/// A simulated pump. Omitting either duty bound simulates a fixed-speed pump.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PumpConfig {
    pub name: String,
    pub duty_min: Option<f32>,
    pub duty_max: Option<f32>,
    /// Cut the pump off after this long, simulating a dry-run sensor.
    pub dry_after_ms: Option<u64>,
}

impl PumpConfig {
    #[must_use]
    pub fn duty(&self) -> Option<ControlRange> {
        bounds(self.duty_min, self.duty_max)
    }

    #[must_use]
    pub fn build(&self) -> VirtualPump {
        VirtualPump::new(&self.name)
            .with_duty(self.duty())
            .with_dry_run_cutoff(self.dry_after_ms.map(Duration::from_millis))
    }
}

fn bounds(min: Option<f32>, max: Option<f32>) -> Option<ControlRange> {
    match (min, max) {
        (Some(min), Some(max)) => Some(ControlRange::new(min, max)),
        _ => None,
    }
}
