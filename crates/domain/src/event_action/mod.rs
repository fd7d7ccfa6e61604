//! Event action — a hardware-triggering behaviour of the machine.
//!
//! Actions form a closed set of variants sharing two capabilities: a
//! human-readable [`description`](EventAction::description) and being
//! triggered by the application layer's engine. New hardware-action kinds are
//! added as new variants.
//!
//! Actions are pure configuration. Resolving devices and driving them happens
//! in `minibar-app`, which matches on the variant.

mod play_audio;
mod run_pump;

pub use play_audio::{AudioFile, PlayAudioAction, PlayAudioActionBuilder};
pub use run_pump::{RunPumpAction, RunPumpActionBuilder};

use serde::{Deserialize, Serialize};

use crate::device::Capability;
use crate::error::MiniBarError;

/// A configured hardware action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventAction {
    /// Play an audio file on a named sound device.
    PlayAudio(PlayAudioAction),
    /// Run a named pump for a fixed duration.
    RunPump(RunPumpAction),
}

impl EventAction {
    /// Stable summary of the action's effect, suitable for display without
    /// executing it.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::PlayAudio(a) => a.description(),
            Self::RunPump(a) => a.description(),
        }
    }

    /// The logical device name the action binds to at trigger time.
    #[must_use]
    pub fn device_name(&self) -> &str {
        match self {
            Self::PlayAudio(a) => a.sound_device(),
            Self::RunPump(a) => a.pump_device(),
        }
    }

    /// The capability the bound device must support.
    #[must_use]
    pub fn capability(&self) -> Capability {
        match self {
            Self::PlayAudio(_) => Capability::AudioSource,
            Self::RunPump(_) => Capability::PumpDriver,
        }
    }

    /// Check domain invariants of the wrapped variant.
    ///
    /// # Errors
    ///
    /// Returns [`MiniBarError::Validation`] when the variant's invariants fail.
    pub fn validate(&self) -> Result<(), MiniBarError> {
        match self {
            Self::PlayAudio(a) => a.validate(),
            Self::RunPump(a) => a.validate(),
        }
    }
}

impl From<PlayAudioAction> for EventAction {
    fn from(action: PlayAudioAction) -> Self {
        Self::PlayAudio(action)
    }
}

impl From<RunPumpAction> for EventAction {
    fn from(action: RunPumpAction) -> Self {
        Self::RunPump(action)
    }
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.description())
    }
}
