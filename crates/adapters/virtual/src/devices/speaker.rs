//! Virtual speaker — plays a clip for a fixed time, or loops until stopped.

use std::time::Duration;

use minibar_app::ports::{
    AudioLine, DeviceError, PlaybackMode, Releasable, StopListener,
};
use minibar_domain::control::ControlRange;
use minibar_domain::device::{Capability, DeviceDescriptor};

use super::timer::Timer;
use super::{DeviceStats, SharedListener, SharedStats, notify};

/// A simulated audio output endpoint.
#[derive(Debug, Clone)]
pub struct VirtualSpeaker {
    name: String,
    gain: Option<ControlRange>,
    clip: Duration,
    stats: SharedStats,
}

impl VirtualSpeaker {
    /// A speaker with a `[-80, 6]` dB gain control playing one-second clips.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            gain: Some(ControlRange::new(-80.0, 6.0)),
            clip: Duration::from_secs(1),
            stats: SharedStats::default(),
        }
    }

    /// Replace the gain control; `None` simulates a line without one.
    #[must_use]
    pub fn with_gain(mut self, gain: Option<ControlRange>) -> Self {
        self.gain = gain;
        self
    }

    /// How long a non-repeating playback lasts.
    #[must_use]
    pub fn with_clip(mut self, clip: Duration) -> Self {
        self.clip = clip;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn descriptor(&self) -> DeviceDescriptor {
        DeviceDescriptor::new(&self.name, [Capability::AudioSource])
    }

    #[must_use]
    pub fn stats(&self) -> DeviceStats {
        self.stats.snapshot()
    }

    pub(crate) fn open(&self) -> Result<VirtualLine, DeviceError> {
        let mut stats = self.stats.lock();
        if stats.is_open() {
            return Err(DeviceError::Unavailable {
                name: self.name.clone(),
                source: "line already open".into(),
            });
        }
        stats.opens += 1;
        Ok(VirtualLine {
            device: self.name.clone(),
            gain: self.gain,
            clip: self.clip,
            stats: self.stats.clone(),
            listener: None,
            loaded: false,
            timer: None,
        })
    }
}

/// An open line on a [`VirtualSpeaker`].
pub struct VirtualLine {
    device: String,
    gain: Option<ControlRange>,
    clip: Duration,
    stats: SharedStats,
    listener: Option<SharedListener>,
    loaded: bool,
    timer: Option<Timer>,
}

impl Releasable for VirtualLine {
    fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        self.stats.lock().stops += 1;
        notify(self.listener.as_ref());
    }

    fn close(&mut self) {
        self.stats.lock().closes += 1;
        self.listener = None;
        tracing::debug!(device = %self.device, "virtual line closed");
    }
}

impl AudioLine for VirtualLine {
    fn on_stop(&mut self, listener: StopListener) {
        self.listener = Some(SharedListener::new(listener));
    }

    fn load(&mut self, clip: &[u8]) -> Result<(), DeviceError> {
        if clip.is_empty() {
            return Err(DeviceError::Decode("clip is empty".into()));
        }
        self.stats.lock().loaded_bytes = Some(clip.len());
        self.loaded = true;
        Ok(())
    }

    fn gain_range(&self) -> Option<ControlRange> {
        self.gain
    }

    fn set_gain(&mut self, value: f32) -> Result<(), DeviceError> {
        let range = self.gain.ok_or(DeviceError::Unsupported("gain control"))?;
        if !range.contains(value) {
            return Err(DeviceError::Driver(format!(
                "gain {value} outside [{}, {}]",
                range.min(),
                range.max()
            )));
        }
        self.stats.lock().last_gain = Some(value);
        Ok(())
    }

    fn start(&mut self, mode: PlaybackMode) -> Result<(), DeviceError> {
        if !self.loaded {
            return Err(DeviceError::Driver("no clip loaded".to_string()));
        }
        self.stats.lock().starts += 1;
        tracing::debug!(device = %self.device, ?mode, "virtual playback started");
        if mode == PlaybackMode::Once
            && let Some(listener) = self.listener.clone()
        {
            self.timer = Some(Timer::start(self.clip, move || listener()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_listener() -> (StopListener, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let listener: StopListener = Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (listener, count)
    }

    fn speaker() -> VirtualSpeaker {
        VirtualSpeaker::new("USB Speaker").with_clip(Duration::from_millis(20))
    }

    #[test]
    fn should_signal_stop_when_clip_ends() {
        let speaker = speaker();
        let mut line = speaker.open().unwrap();
        let (listener, count) = counting_listener();
        line.on_stop(listener);
        line.load(b"RIFF").unwrap();
        line.start(PlaybackMode::Once).unwrap();

        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn should_keep_looping_until_stopped() {
        let speaker = speaker();
        let mut line = speaker.open().unwrap();
        let (listener, count) = counting_listener();
        line.on_stop(listener);
        line.load(b"RIFF").unwrap();
        line.start(PlaybackMode::Loop).unwrap();

        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        line.stop();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn should_reject_second_open_while_line_is_held() {
        let speaker = speaker();
        let mut line = speaker.open().unwrap();
        assert!(matches!(
            speaker.open(),
            Err(DeviceError::Unavailable { .. })
        ));

        line.stop();
        line.close();
        assert!(speaker.open().is_ok());
    }

    #[test]
    fn should_reject_empty_clip() {
        let mut line = speaker().open().unwrap();
        assert!(matches!(line.load(&[]), Err(DeviceError::Decode(_))));
    }

    #[test]
    fn should_refuse_to_start_without_clip() {
        let mut line = speaker().open().unwrap();
        assert!(matches!(
            line.start(PlaybackMode::Once),
            Err(DeviceError::Driver(_))
        ));
    }

    #[test]
    fn should_reject_gain_outside_range() {
        let mut line = speaker().open().unwrap();
        assert!(line.set_gain(12.0).is_err());
        assert!(line.set_gain(-17.0).is_ok());
    }

    #[test]
    fn should_report_missing_gain_control() {
        let mut line = speaker().with_gain(None).open().unwrap();
        assert_eq!(line.gain_range(), None);
        assert!(matches!(
            line.set_gain(0.0),
            Err(DeviceError::Unsupported("gain control"))
        ));
    }

    #[test]
    fn should_record_stats() {
        let speaker = speaker();
        let mut line = speaker.open().unwrap();
        line.load(b"RIFF").unwrap();
        line.set_gain(-17.0).unwrap();
        line.stop();
        line.close();

        let stats = speaker.stats();
        assert_eq!((stats.opens, stats.stops, stats.closes), (1, 1, 1));
        assert_eq!(stats.last_gain, Some(-17.0));
        assert_eq!(stats.loaded_bytes, Some(4));
        assert!(!stats.is_open());
    }
}
