//! Device port — enumeration of attached hardware and the handles it opens.
//!
//! A device directory bridges a hardware backend (virtual, `cpal`, GPIO, …)
//! into the engine. The engine calls the handle methods in order:
//!
//! 1. [`DeviceDirectory::devices`] — enumerate what is attached right now
//! 2. `open_line` / `open_channel` — acquire a handle for one endpoint
//! 3. `on_stop` — attach the completion listener
//! 4. configuration (`load`, `set_gain`, `set_duty`)
//! 5. `start` — begin the physical effect
//! 6. once the stop listener fired, [`Releasable::take_fault`] to learn
//!    whether the activity stopped because of a driver fault
//! 7. [`Releasable::stop`] then [`Releasable::close`] — always, exactly once

use std::error::Error;

use minibar_domain::control::ControlRange;
use minibar_domain::device::DeviceDescriptor;
use minibar_domain::error::ActionError;

/// Callback invoked by a driver when its activity stops.
///
/// Drivers may call it from any thread and more than once (e.g. natural end
/// followed by an explicit stop); only the first call is meaningful.
pub type StopListener = Box<dyn Fn() + Send + Sync>;

/// Errors raised by device backends.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// Listing the attached endpoints failed.
    #[error("failed to enumerate devices")]
    Enumeration(#[source] Box<dyn Error + Send + Sync>),

    /// The endpoint vanished or could not be opened.
    #[error("device {name:?} is unavailable")]
    Unavailable {
        name: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },

    /// Reading a referenced resource failed.
    #[error("i/o error")]
    Io(#[from] std::io::Error),

    /// The loaded resource is not in a format the line can play.
    #[error("failed to decode audio data")]
    Decode(#[source] Box<dyn Error + Send + Sync>),

    /// The driver reported a fault.
    #[error("driver fault: {0}")]
    Driver(String),

    /// The backend cannot provide the requested kind of handle.
    #[error("{0} is not supported by this backend")]
    Unsupported(&'static str),
}

impl From<DeviceError> for ActionError {
    fn from(err: DeviceError) -> Self {
        ActionError::execution(err)
    }
}

/// How an audio line plays its loaded clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    /// Play the clip once; the line signals stop at its natural end.
    Once,
    /// Loop the clip until stopped explicitly.
    Loop,
}

/// Teardown shared by every hardware handle.
///
/// `stop` and `close` are infallible: a release must always complete.
pub trait Releasable {
    /// The fault that ended the activity asynchronously, if any.
    ///
    /// Drivers whose activity can die on another thread (a stream error, a
    /// device unplugged mid-run) record the fault, fire the stop listener,
    /// and hand the fault out here once.
    fn take_fault(&mut self) -> Option<DeviceError> {
        None
    }

    /// Halt the activity.
    fn stop(&mut self);

    /// Free the underlying endpoint.
    fn close(&mut self);
}

/// An audio output line.
pub trait AudioLine: Releasable {
    /// Register the listener fired when playback stops.
    fn on_stop(&mut self, listener: StopListener);

    /// Load the clip to play.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Decode`] for an unreadable clip, or a driver error.
    fn load(&mut self, clip: &[u8]) -> Result<(), DeviceError>;

    /// Native range of the master gain control, if the line has one.
    fn gain_range(&self) -> Option<ControlRange>;

    /// Set the master gain, in the units of [`gain_range`](Self::gain_range).
    ///
    /// # Errors
    ///
    /// Returns a driver error if the control rejects the value.
    fn set_gain(&mut self, value: f32) -> Result<(), DeviceError>;

    /// Start playback.
    ///
    /// # Errors
    ///
    /// Returns a driver error if playback cannot start.
    fn start(&mut self, mode: PlaybackMode) -> Result<(), DeviceError>;
}

/// A pump motor driver channel.
pub trait PumpChannel: Releasable {
    /// Register the listener fired when the pump stops on its own.
    fn on_stop(&mut self, listener: StopListener);

    /// Native range of the duty control, if the channel has one.
    fn duty_range(&self) -> Option<ControlRange>;

    /// Set the duty, in the units of [`duty_range`](Self::duty_range).
    ///
    /// # Errors
    ///
    /// Returns a driver error if the control rejects the value.
    fn set_duty(&mut self, value: f32) -> Result<(), DeviceError>;

    /// Energise the pump.
    ///
    /// # Errors
    ///
    /// Returns a driver error if the channel cannot start.
    fn start(&mut self) -> Result<(), DeviceError>;
}

/// Injected view of the attached hardware.
///
/// Implementations must re-read the hardware on every [`devices`](Self::devices)
/// call: endpoints are hot-pluggable.
pub trait DeviceDirectory: Send + Sync {
    type Line: AudioLine;
    type Channel: PumpChannel;

    /// List every endpoint attached right now.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Enumeration`] when the backend cannot be queried.
    fn devices(&self) -> Result<Vec<DeviceDescriptor>, DeviceError>;

    /// Open an audio line on `device`.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Unavailable`] if the endpoint cannot be opened.
    fn open_line(&self, device: &DeviceDescriptor) -> Result<Self::Line, DeviceError>;

    /// Open a pump channel on `device`.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Unavailable`] if the endpoint cannot be opened,
    /// or [`DeviceError::Unsupported`] for backends without pumps.
    fn open_channel(&self, device: &DeviceDescriptor) -> Result<Self::Channel, DeviceError>;
}
