//! Virtual device implementations — speaker and pump.
//!
//! Every endpoint shares a [`DeviceStats`] record with the directory so
//! tests and demos can check how the engine drove it.

mod pump;
mod speaker;
mod timer;

pub use pump::{VirtualChannel, VirtualPump};
pub use speaker::{VirtualLine, VirtualSpeaker};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use minibar_app::ports::StopListener;

/// Counters and last applied settings of one virtual endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceStats {
    pub opens: usize,
    pub starts: usize,
    pub stops: usize,
    pub closes: usize,
    pub last_gain: Option<f32>,
    pub last_duty: Option<f32>,
    pub loaded_bytes: Option<usize>,
}

impl DeviceStats {
    /// Whether a handle is currently open on the endpoint.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.opens > self.closes
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SharedStats(Arc<Mutex<DeviceStats>>);

impl SharedStats {
    pub fn lock(&self) -> MutexGuard<'_, DeviceStats> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> DeviceStats {
        self.lock().clone()
    }
}

pub(crate) type SharedListener = Arc<StopListener>;

pub(crate) fn notify(listener: Option<&SharedListener>) {
    if let Some(listener) = listener {
        listener();
    }
}
