//! WAV decoding into normalised interleaved `f32` frames.

use std::io::Cursor;
use std::time::Duration;

/// Errors raised while decoding a clip.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid wav data")]
    Wav(#[from] hound::Error),

    #[error("wav data declares no channels")]
    NoChannels,
}

/// A decoded PCM clip held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmClip {
    channels: u16,
    sample_rate: u32,
    /// Interleaved samples in `[-1.0, 1.0]`.
    samples: Vec<f32>,
}

impl PcmClip {
    /// Decode a RIFF/WAVE byte buffer. Integer samples are scaled by
    /// `2^(bits - 1)`; float samples are kept as-is.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the bytes are not a readable WAV stream.
    #[allow(clippy::cast_precision_loss)]
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let reader = hound::WavReader::new(Cursor::new(bytes))?;
        let spec = reader.spec();
        if spec.channels == 0 {
            return Err(DecodeError::NoChannels);
        }

        let samples = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<Result<Vec<_>, _>>()?,
            hound::SampleFormat::Int => {
                let scale = (1_i64 << spec.bits_per_sample.saturating_sub(1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        Ok(Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            samples,
        })
    }

    #[must_use]
    pub fn channels(&self) -> u16 {
        self.channels
    }

    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of frames (samples per channel).
    #[must_use]
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels)
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let frames = u64::try_from(self.frames()).unwrap_or(u64::MAX);
        Duration::from_micros(frames.saturating_mul(1_000_000) / u64::from(self.sample_rate))
    }

    /// Sample of `channel` at `frame`, or silence out of bounds.
    #[must_use]
    pub fn sample(&self, frame: usize, channel: usize) -> f32 {
        self.samples
            .get(frame * usize::from(self.channels) + channel)
            .copied()
            .unwrap_or(0.0)
    }
}
