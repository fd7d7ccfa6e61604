//! # minibar-adapter-virtual
//!
//! Virtual/demo device backend that provides simulated endpoints for testing
//! and demonstration purposes.
//!
//! ## Provided devices
//!
//! | Device | Capability | Behaviour |
//! |--------|------------|-----------|
//! | [`VirtualSpeaker`] | audio source | Signals stop when its clip length elapses; loops until stopped |
//! | [`VirtualPump`] | pump driver | Runs until stopped, or until its dry-run cutoff fires |
//!
//! Endpoints can be attached and detached while the engine runs, which
//! simulates hot-plugging; every enumeration sees the current set.
//!
//! ## Dependency rule
//!
//! Depends on `minibar-app` (port traits) and `minibar-domain` only.

pub mod config;
mod devices;

use std::sync::{Mutex, MutexGuard, PoisonError};

use minibar_app::ports::{DeviceDirectory, DeviceError};
use minibar_domain::device::DeviceDescriptor;

pub use config::VirtualConfig;
pub use devices::{DeviceStats, VirtualChannel, VirtualLine, VirtualPump, VirtualSpeaker};

#[derive(Debug, Clone)]
enum Endpoint {
    Speaker(VirtualSpeaker),
    Pump(VirtualPump),
}

impl Endpoint {
    fn name(&self) -> &str {
        match self {
            Self::Speaker(s) => s.name(),
            Self::Pump(p) => p.name(),
        }
    }

    fn descriptor(&self) -> DeviceDescriptor {
        match self {
            Self::Speaker(s) => s.descriptor(),
            Self::Pump(p) => p.descriptor(),
        }
    }

    fn stats(&self) -> DeviceStats {
        match self {
            Self::Speaker(s) => s.stats(),
            Self::Pump(p) => p.stats(),
        }
    }
}

/// Hot-pluggable directory of simulated endpoints.
#[derive(Debug, Default)]
pub struct VirtualDirectory {
    endpoints: Mutex<Vec<Endpoint>>,
}

impl VirtualDirectory {
    /// Attach every endpoint listed in `config`.
    #[must_use]
    pub fn from_config(config: &VirtualConfig) -> Self {
        let directory = Self::default();
        for speaker in &config.speakers {
            directory.attach_speaker(speaker.build());
        }
        for pump in &config.pumps {
            directory.attach_pump(pump.build());
        }
        directory
    }

    fn endpoints(&self) -> MutexGuard<'_, Vec<Endpoint>> {
        self.endpoints.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Plug in a speaker.
    pub fn attach_speaker(&self, speaker: VirtualSpeaker) {
        tracing::info!(device = speaker.name(), "virtual speaker attached");
        self.endpoints().push(Endpoint::Speaker(speaker));
    }

    /// Plug in a pump.
    pub fn attach_pump(&self, pump: VirtualPump) {
        tracing::info!(device = pump.name(), "virtual pump attached");
        self.endpoints().push(Endpoint::Pump(pump));
    }

    /// Unplug every endpoint named `name`. Returns how many were removed.
    pub fn detach(&self, name: &str) -> usize {
        let mut endpoints = self.endpoints();
        let before = endpoints.len();
        endpoints.retain(|e| e.name() != name);
        let removed = before - endpoints.len();
        if removed > 0 {
            tracing::info!(device = name, "virtual device detached");
        }
        removed
    }

    /// Stats of the first endpoint named `name`.
    #[must_use]
    pub fn stats(&self, name: &str) -> Option<DeviceStats> {
        self.endpoints()
            .iter()
            .find(|e| e.name() == name)
            .map(Endpoint::stats)
    }

    fn unplugged(device: &DeviceDescriptor) -> DeviceError {
        DeviceError::Unavailable {
            name: device.name.clone(),
            source: "device unplugged".into(),
        }
    }
}

impl DeviceDirectory for VirtualDirectory {
    type Line = VirtualLine;
    type Channel = VirtualChannel;

    fn devices(&self) -> Result<Vec<DeviceDescriptor>, DeviceError> {
        Ok(self.endpoints().iter().map(Endpoint::descriptor).collect())
    }

    fn open_line(&self, device: &DeviceDescriptor) -> Result<VirtualLine, DeviceError> {
        let speaker = self.endpoints().iter().find_map(|e| match e {
            Endpoint::Speaker(s) if s.name() == device.name => Some(s.clone()),
            _ => None,
        });
        speaker.ok_or_else(|| Self::unplugged(device))?.open()
    }

    fn open_channel(&self, device: &DeviceDescriptor) -> Result<VirtualChannel, DeviceError> {
        let pump = self.endpoints().iter().find_map(|e| match e {
            Endpoint::Pump(p) if p.name() == device.name => Some(p.clone()),
            _ => None,
        });
        pump.ok_or_else(|| Self::unplugged(device))?.open()
    }
}
