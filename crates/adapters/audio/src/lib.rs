//! # minibar-adapter-audio
//!
//! Audio output for real speakers.
//!
//! - [`wav`] decodes RIFF/WAVE clips with `hound` into normalised `f32` frames
//! - [`gain`] holds the software gain stage (decibel range, lock-free level)
//!   and the playhead that feeds output buffers
//! - with the `cpal` feature, `CpalDirectory` exposes every output device of
//!   the default host as an audio source
//!
//! ## Dependency rule
//!
//! Depends on `minibar-app` (port traits) and `minibar-domain` only.

pub mod gain;
#[cfg(feature = "cpal")]
mod playback;
pub mod wav;

#[cfg(feature = "cpal")]
pub use playback::{CpalDirectory, CpalLine, NoChannel};
pub use wav::{DecodeError, PcmClip};
