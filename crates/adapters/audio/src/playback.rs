//! `cpal` output backend.
//!
//! Every output device of the default host is exposed as an audio source.
//! The host is queried again on each enumeration, so devices plugged in
//! after startup are found by the next trigger.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use minibar_app::ports::{
    AudioLine, DeviceDirectory, DeviceError, PlaybackMode, PumpChannel, Releasable, StopListener,
};
use minibar_domain::control::ControlRange;
use minibar_domain::device::{Capability, DeviceDescriptor};

use crate::gain::{Playhead, SharedGain, gain_range};
use crate::wav::PcmClip;

/// Device directory over the default `cpal` host.
#[derive(Debug, Default)]
pub struct CpalDirectory;

impl CpalDirectory {
    fn output_devices() -> Result<Vec<(String, cpal::Device)>, DeviceError> {
        let host = cpal::default_host();
        let devices = host
            .output_devices()
            .map_err(|err| DeviceError::Enumeration(err.to_string().into()))?;
        Ok(devices
            .filter_map(|device| device.name().ok().map(|name| (name, device)))
            .collect())
    }
}

impl DeviceDirectory for CpalDirectory {
    type Line = CpalLine;
    type Channel = NoChannel;

    fn devices(&self) -> Result<Vec<DeviceDescriptor>, DeviceError> {
        Ok(Self::output_devices()?
            .into_iter()
            .map(|(name, _)| DeviceDescriptor::new(name, [Capability::AudioSource]))
            .collect())
    }

    fn open_line(&self, descriptor: &DeviceDescriptor) -> Result<CpalLine, DeviceError> {
        let device = Self::output_devices()?
            .into_iter()
            .find(|(name, _)| *name == descriptor.name)
            .map(|(_, device)| device)
            .ok_or_else(|| DeviceError::Unavailable {
                name: descriptor.name.clone(),
                source: "output device disappeared".into(),
            })?;
        Ok(CpalLine::new(descriptor.name.clone(), device))
    }

    fn open_channel(&self, _descriptor: &DeviceDescriptor) -> Result<NoChannel, DeviceError> {
        Err(DeviceError::Unsupported("pump channels"))
    }
}

#[derive(Default)]
struct Shared {
    gain: SharedGain,
    playing: AtomicBool,
    listener: Mutex<Option<StopListener>>,
    fault: Mutex<Option<String>>,
}

impl Shared {
    /// Keep the first stream error and end playback.
    fn fail(&self, err: &cpal::StreamError) {
        self.fault
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert_with(|| err.to_string());
        if self.playing.swap(false, Ordering::AcqRel) {
            self.notify();
        }
    }

    fn notify(&self) {
        let listener = self.listener.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(listener) = listener.as_ref() {
            listener();
        }
    }
}

/// An output stream on one `cpal` device, with a software gain stage.
pub struct CpalLine {
    name: String,
    device: cpal::Device,
    clip: Option<Arc<PcmClip>>,
    shared: Arc<Shared>,
    stream: Option<cpal::Stream>,
}

impl CpalLine {
    fn new(name: String, device: cpal::Device) -> Self {
        Self {
            name,
            device,
            clip: None,
            shared: Arc::default(),
            stream: None,
        }
    }

    fn stream_config(&self, clip: &PcmClip) -> Result<StreamConfig, DeviceError> {
        let rate = SampleRate(clip.sample_rate());
        let supported = self
            .device
            .supported_output_configs()
            .map_err(|err| DeviceError::Driver(err.to_string()))?
            .filter(|c| c.sample_format() == SampleFormat::F32)
            .find(|c| c.min_sample_rate() <= rate && c.max_sample_rate() >= rate)
            .map(|c| c.with_sample_rate(rate))
            .ok_or_else(|| {
                DeviceError::Driver(format!(
                    "{} has no f32 output at {} Hz",
                    self.name,
                    clip.sample_rate()
                ))
            })?;
        Ok(supported.config())
    }
}

impl Releasable for CpalLine {
    fn take_fault(&mut self) -> Option<DeviceError> {
        self.shared
            .fault
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .map(|msg| DeviceError::Unavailable {
                name: self.name.clone(),
                source: msg.into(),
            })
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take()
            && let Err(err) = stream.pause()
        {
            tracing::warn!(%err, device = %self.name, "failed to pause output stream");
        }
        self.shared.playing.store(false, Ordering::Release);
        self.shared.notify();
    }

    fn close(&mut self) {
        self.stream = None;
        self.clip = None;
        self.shared
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

impl AudioLine for CpalLine {
    fn on_stop(&mut self, listener: StopListener) {
        *self
            .shared
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(listener);
    }

    fn load(&mut self, clip: &[u8]) -> Result<(), DeviceError> {
        let clip = PcmClip::decode(clip).map_err(|err| DeviceError::Decode(Box::new(err)))?;
        tracing::debug!(
            device = %self.name,
            channels = clip.channels(),
            sample_rate = clip.sample_rate(),
            duration = ?clip.duration(),
            "clip decoded"
        );
        self.clip = Some(Arc::new(clip));
        Ok(())
    }

    fn gain_range(&self) -> Option<ControlRange> {
        Some(gain_range())
    }

    fn set_gain(&mut self, value: f32) -> Result<(), DeviceError> {
        self.shared.gain.set_db(value);
        Ok(())
    }

    fn start(&mut self, mode: PlaybackMode) -> Result<(), DeviceError> {
        let clip = self
            .clip
            .clone()
            .ok_or_else(|| DeviceError::Driver("no clip loaded".to_string()))?;
        let config = self.stream_config(&clip)?;
        let channels = usize::from(config.channels);
        let mut playhead = Playhead::new(clip, mode == PlaybackMode::Loop);

        let shared = Arc::clone(&self.shared);
        shared.playing.store(true, Ordering::Release);
        let on_error = Arc::clone(&self.shared);
        let device = self.name.clone();
        let stream = self
            .device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let playing = playhead.fill(data, channels, shared.gain.linear());
                    if !playing && shared.playing.swap(false, Ordering::AcqRel) {
                        shared.notify();
                    }
                },
                move |err| {
                    tracing::warn!(%err, %device, "output stream error");
                    on_error.fail(&err);
                },
                None,
            )
            .map_err(|err| DeviceError::Driver(err.to_string()))?;
        stream
            .play()
            .map_err(|err| DeviceError::Driver(err.to_string()))?;
        self.stream = Some(stream);
        Ok(())
    }
}

/// Pump channel type of a backend that has none.
pub enum NoChannel {}

impl Releasable for NoChannel {
    fn stop(&mut self) {
        match *self {}
    }

    fn close(&mut self) {
        match *self {}
    }
}

impl PumpChannel for NoChannel {
    fn on_stop(&mut self, _listener: StopListener) {
        match *self {}
    }

    fn duty_range(&self) -> Option<ControlRange> {
        match *self {}
    }

    fn set_duty(&mut self, _value: f32) -> Result<(), DeviceError> {
        match *self {}
    }

    fn start(&mut self) -> Result<(), DeviceError> {
        match *self {}
    }
}
