//! Device descriptor — a currently attached hardware endpoint as reported by
//! enumeration.
//!
//! Descriptors are transient: they describe what is plugged in *now* and are
//! re-read on every trigger.

use serde::{Deserialize, Serialize};

/// What an endpoint can be opened as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Can act as an audio source line (plays a loaded clip).
    AudioSource,
    /// Can drive a pump motor channel.
    PumpDriver,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AudioSource => f.write_str("audio source"),
            Self::PumpDriver => f.write_str("pump driver"),
        }
    }
}

/// A named endpoint and the capabilities it supports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub name: String,
    pub capabilities: Vec<Capability>,
}

impl DeviceDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        Self {
            name: name.into(),
            capabilities: capabilities.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}
