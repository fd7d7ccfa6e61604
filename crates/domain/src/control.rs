//! Control range — maps a normalized percentage onto a device's native range.
//!
//! Used for audio gain (decibels) and pump duty (driver units). A device that
//! exposes no range leaves the control at its default; callers model that as
//! `Option<ControlRange>`.

use serde::{Deserialize, Serialize};

/// Inclusive `[min, max]` range of a hardware control.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlRange {
    min: f32,
    max: f32,
}

impl ControlRange {
    /// Build a range; bounds given in the wrong order are swapped.
    #[must_use]
    pub fn new(min: f32, max: f32) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    #[must_use]
    pub fn min(&self) -> f32 {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Map `percent` (nominally `0..=100`) to `min + (max - min) * percent / 100`,
    /// clamped to the range.
    ///
    /// The bounds are returned exactly for `percent <= 0` and `percent >= 100`.
    #[must_use]
    pub fn map_percent(&self, percent: f32) -> f32 {
        if percent <= 0.0 {
            return self.min;
        }
        if percent >= 100.0 {
            return self.max;
        }
        let value = self.min + (self.max - self.min) * percent / 100.0;
        value.min(self.max).max(self.min)
    }

    #[must_use]
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}
