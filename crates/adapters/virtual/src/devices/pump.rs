//! Virtual pump — runs until stopped, or until its reservoir runs dry.

use std::time::Duration;

use minibar_app::ports::{DeviceError, PumpChannel, Releasable, StopListener};
use minibar_domain::control::ControlRange;
use minibar_domain::device::{Capability, DeviceDescriptor};

use super::timer::Timer;
use super::{DeviceStats, SharedListener, SharedStats, notify};

/// A simulated pump motor driver.
#[derive(Debug, Clone)]
pub struct VirtualPump {
    name: String,
    duty: Option<ControlRange>,
    dry_after: Option<Duration>,
    stats: SharedStats,
}

impl VirtualPump {
    /// A pump with an 8-bit `[0, 255]` duty control that never runs dry.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            duty: Some(ControlRange::new(0.0, 255.0)),
            dry_after: None,
            stats: SharedStats::default(),
        }
    }

    /// Replace the duty control; `None` simulates a fixed-speed pump.
    #[must_use]
    pub fn with_duty(mut self, duty: Option<ControlRange>) -> Self {
        self.duty = duty;
        self
    }

    /// Cut the pump off after running for `after`, as a dry-run sensor would.
    #[must_use]
    pub fn with_dry_run_cutoff(mut self, after: Option<Duration>) -> Self {
        self.dry_after = after;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn descriptor(&self) -> DeviceDescriptor {
        DeviceDescriptor::new(&self.name, [Capability::PumpDriver])
    }

    #[must_use]
    pub fn stats(&self) -> DeviceStats {
        self.stats.snapshot()
    }

    pub(crate) fn open(&self) -> Result<VirtualChannel, DeviceError> {
        let mut stats = self.stats.lock();
        if stats.is_open() {
            return Err(DeviceError::Unavailable {
                name: self.name.clone(),
                source: "channel already open".into(),
            });
        }
        stats.opens += 1;
        Ok(VirtualChannel {
            device: self.name.clone(),
            duty: self.duty,
            dry_after: self.dry_after,
            stats: self.stats.clone(),
            listener: None,
            cutoff: None,
        })
    }
}

/// An open channel on a [`VirtualPump`].
pub struct VirtualChannel {
    device: String,
    duty: Option<ControlRange>,
    dry_after: Option<Duration>,
    stats: SharedStats,
    listener: Option<SharedListener>,
    cutoff: Option<Timer>,
}

impl Releasable for VirtualChannel {
    fn stop(&mut self) {
        if let Some(cutoff) = self.cutoff.take() {
            cutoff.cancel();
        }
        self.stats.lock().stops += 1;
        notify(self.listener.as_ref());
    }

    fn close(&mut self) {
        self.stats.lock().closes += 1;
        self.listener = None;
        tracing::debug!(device = %self.device, "virtual channel closed");
    }
}

impl PumpChannel for VirtualChannel {
    fn on_stop(&mut self, listener: StopListener) {
        self.listener = Some(SharedListener::new(listener));
    }

    fn duty_range(&self) -> Option<ControlRange> {
        self.duty
    }

    fn set_duty(&mut self, value: f32) -> Result<(), DeviceError> {
        let range = self.duty.ok_or(DeviceError::Unsupported("duty control"))?;
        if !range.contains(value) {
            return Err(DeviceError::Driver(format!(
                "duty {value} outside [{}, {}]",
                range.min(),
                range.max()
            )));
        }
        self.stats.lock().last_duty = Some(value);
        Ok(())
    }

    fn start(&mut self) -> Result<(), DeviceError> {
        self.stats.lock().starts += 1;
        tracing::debug!(device = %self.device, "virtual pump energised");
        if let (Some(after), Some(listener)) = (self.dry_after, self.listener.clone()) {
            let device = self.device.clone();
            self.cutoff = Some(Timer::start(after, move || {
                tracing::warn!(%device, "reservoir dry, pump cut off");
                listener();
            }));
        }
        Ok(())
    }
}
