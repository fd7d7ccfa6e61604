//! Run pump — drives a named pump channel at a given power for a fixed time.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MiniBarError, ValidationError};

/// Configuration of a run-pump action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunPumpAction {
    pump_device: String,
    /// Nominal percent of the driver's duty range.
    power: u16,
    duration_ms: u64,
}

impl RunPumpAction {
    /// Create a builder for constructing a [`RunPumpAction`].
    #[must_use]
    pub fn builder() -> RunPumpActionBuilder {
        RunPumpActionBuilder::default()
    }

    #[must_use]
    pub fn pump_device(&self) -> &str {
        &self.pump_device
    }

    #[must_use]
    pub fn power(&self) -> u16 {
        self.power
    }

    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    #[must_use]
    pub fn description(&self) -> String {
        format!(
            "Run pump {:?} at {}% for {}ms",
            self.pump_device, self.power, self.duration_ms
        )
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`MiniBarError::Validation`] when:
    /// - `pump_device` is empty ([`ValidationError::EmptyDeviceName`])
    /// - `duration_ms` is zero ([`ValidationError::ZeroDuration`])
    pub fn validate(&self) -> Result<(), MiniBarError> {
        if self.pump_device.is_empty() {
            return Err(ValidationError::EmptyDeviceName.into());
        }
        if self.duration_ms == 0 {
            return Err(ValidationError::ZeroDuration.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`RunPumpAction`].
#[derive(Debug, Default)]
pub struct RunPumpActionBuilder {
    pump_device: Option<String>,
    power: Option<u16>,
    duration_ms: Option<u64>,
}

impl RunPumpActionBuilder {
    #[must_use]
    pub fn pump_device(mut self, name: impl Into<String>) -> Self {
        self.pump_device = Some(name.into());
        self
    }

    #[must_use]
    pub fn power(mut self, power: u16) -> Self {
        self.power = Some(power);
        self
    }

    #[must_use]
    pub fn duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Consume the builder, validate, and return a [`RunPumpAction`].
    ///
    /// Power defaults to 100%.
    ///
    /// # Errors
    ///
    /// Returns [`MiniBarError::Validation`] if required fields are missing or invalid.
    pub fn build(self) -> Result<RunPumpAction, MiniBarError> {
        let action = RunPumpAction {
            pump_device: self.pump_device.unwrap_or_default(),
            power: self.power.unwrap_or(100),
            duration_ms: self.duration_ms.unwrap_or_default(),
        };
        action.validate()?;
        Ok(action)
    }
}
