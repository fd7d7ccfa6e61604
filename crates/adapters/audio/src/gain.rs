//! Software gain stage and playhead feeding an interleaved output buffer.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use minibar_domain::control::ControlRange;

use crate::wav::PcmClip;

/// Gain at or below which output is silent.
pub const MIN_GAIN_DB: f32 = -80.0;
/// +6 dB, a linear factor of two.
pub const MAX_GAIN_DB: f32 = 6.0206;

/// Master gain range exposed by software lines, in decibels.
#[must_use]
pub fn gain_range() -> ControlRange {
    ControlRange::new(MIN_GAIN_DB, MAX_GAIN_DB)
}

/// Convert decibels to a linear amplitude factor.
#[must_use]
pub fn db_to_linear(db: f32) -> f32 {
    if db <= MIN_GAIN_DB {
        0.0
    } else {
        10_f32.powf(db / 20.0)
    }
}

/// Linear gain shared lock-free with an audio callback.
#[derive(Debug)]
pub struct SharedGain(AtomicU32);

impl Default for SharedGain {
    fn default() -> Self {
        Self(AtomicU32::new(1.0_f32.to_bits()))
    }
}

impl SharedGain {
    pub fn set_db(&self, db: f32) {
        self.0.store(db_to_linear(db).to_bits(), Ordering::Relaxed);
    }

    #[must_use]
    pub fn linear(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }
}

/// Read position over a clip.
#[derive(Debug)]
pub struct Playhead {
    clip: Arc<PcmClip>,
    frame: usize,
    looping: bool,
}

impl Playhead {
    #[must_use]
    pub fn new(clip: Arc<PcmClip>, looping: bool) -> Self {
        Self {
            clip,
            frame: 0,
            looping,
        }
    }

    /// Fill `out`, interleaved with `channels` channels, applying `gain`.
    ///
    /// Output channels beyond the clip's wrap around its channels. Returns
    /// `false` once a non-looping clip has been played to the end; the rest
    /// of `out` is then silence.
    pub fn fill(&mut self, out: &mut [f32], channels: usize, gain: f32) -> bool {
        let frames = self.clip.frames();
        let source_channels = usize::from(self.clip.channels());
        let mut playing = true;

        for frame in out.chunks_mut(channels.max(1)) {
            if self.frame >= frames {
                if self.looping && frames > 0 {
                    self.frame = 0;
                } else {
                    frame.fill(0.0);
                    playing = false;
                    continue;
                }
            }
            for (channel, sample) in frame.iter_mut().enumerate() {
                *sample = self.clip.sample(self.frame, channel % source_channels) * gain;
            }
            self.frame += 1;
        }
        playing
    }
}
