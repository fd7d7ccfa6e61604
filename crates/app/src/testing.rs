//! In-memory device directory recording every call, shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use minibar_domain::control::ControlRange;
use minibar_domain::device::{Capability, DeviceDescriptor};

use crate::ports::{
    AudioLine, DeviceDirectory, DeviceError, PlaybackMode, PumpChannel, Releasable, StopListener,
};

/// What a fake handle does when driven.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Behaviour {
    /// Report a stop as soon as `start` is called.
    CompleteOnStart,
    /// Report a stop from another thread after the delay.
    CompleteAfter(Duration),
    /// Only report a stop when stopped explicitly.
    NeverComplete,
    FailOpen,
    FailLoad,
    FailStart,
    /// Reject the gain or duty value.
    FailGain,
    /// Record a driver fault and report a stop right after starting.
    FaultOnStart,
    PanicOnLoad,
    /// Drop the stop listener when started, never reporting anything.
    DropListenerOnStart,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct Calls {
    pub opens: usize,
    pub starts: usize,
    pub stops: usize,
    pub closes: usize,
    pub gain: Option<f32>,
    pub duty: Option<f32>,
    pub mode: Option<PlaybackMode>,
    pub events: Vec<&'static str>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // teardown runs while a panic unwinds in some tests
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone)]
pub(crate) struct FakeDevice {
    descriptor: DeviceDescriptor,
    range: Option<ControlRange>,
    behaviour: Behaviour,
    calls: Arc<Mutex<Calls>>,
}

impl FakeDevice {
    pub fn speaker(name: &str) -> Self {
        Self {
            descriptor: DeviceDescriptor::new(name, [Capability::AudioSource]),
            range: Some(ControlRange::new(-40.0, 6.0)),
            behaviour: Behaviour::CompleteOnStart,
            calls: Arc::default(),
        }
    }

    pub fn pump(name: &str) -> Self {
        Self {
            descriptor: DeviceDescriptor::new(name, [Capability::PumpDriver]),
            range: Some(ControlRange::new(0.0, 255.0)),
            behaviour: Behaviour::NeverComplete,
            calls: Arc::default(),
        }
    }

    pub fn with_range(mut self, range: Option<ControlRange>) -> Self {
        self.range = range;
        self
    }

    pub fn with_behaviour(mut self, behaviour: Behaviour) -> Self {
        self.behaviour = behaviour;
        self
    }

    pub fn calls(&self) -> Calls {
        lock(&self.calls).clone()
    }

    fn record(&self, event: &'static str) -> MutexGuard<'_, Calls> {
        let mut calls = lock(&self.calls);
        calls.events.push(event);
        calls
    }
}

pub(crate) struct FakeHandle {
    device: FakeDevice,
    listener: Option<Arc<StopListener>>,
    fault: Option<DeviceError>,
}

impl FakeHandle {
    fn notify_stop(&self) {
        if let Some(listener) = &self.listener {
            listener();
        }
    }

    fn set_control(&mut self, control: &'static str, value: f32) -> Result<(), DeviceError> {
        let mut calls = self.device.record(control);
        if matches!(self.device.behaviour, Behaviour::FailGain) {
            return Err(DeviceError::Driver(format!("{control} {value} rejected")));
        }
        if control == "gain" {
            calls.gain = Some(value);
        } else {
            calls.duty = Some(value);
        }
        Ok(())
    }

    fn start_activity(&mut self) -> Result<(), DeviceError> {
        self.device.record("start").starts += 1;
        match self.device.behaviour {
            Behaviour::CompleteOnStart => self.notify_stop(),
            Behaviour::CompleteAfter(delay) => {
                if let Some(listener) = self.listener.clone() {
                    std::thread::spawn(move || {
                        std::thread::sleep(delay);
                        listener();
                    });
                }
            }
            Behaviour::FailStart => return Err(DeviceError::Driver("refused to start".into())),
            Behaviour::DropListenerOnStart => self.listener = None,
            Behaviour::FaultOnStart => {
                self.fault = Some(DeviceError::Driver("device unplugged mid-run".into()));
                self.notify_stop();
            }
            _ => {}
        }
        Ok(())
    }
}

impl Releasable for FakeHandle {
    fn take_fault(&mut self) -> Option<DeviceError> {
        self.fault.take()
    }

    fn stop(&mut self) {
        self.device.record("stop").stops += 1;
        // real lines emit a stop event when halted explicitly too
        self.notify_stop();
    }

    fn close(&mut self) {
        self.device.record("close").closes += 1;
        self.listener = None;
    }
}

impl AudioLine for FakeHandle {
    fn on_stop(&mut self, listener: StopListener) {
        self.listener = Some(Arc::new(listener));
    }

    fn load(&mut self, _clip: &[u8]) -> Result<(), DeviceError> {
        self.device.record("load");
        match self.device.behaviour {
            Behaviour::FailLoad => Err(DeviceError::Decode("not a RIFF file".into())),
            Behaviour::PanicOnLoad => panic!("driver crashed while loading"),
            _ => Ok(()),
        }
    }

    fn gain_range(&self) -> Option<ControlRange> {
        self.device.range
    }

    fn set_gain(&mut self, value: f32) -> Result<(), DeviceError> {
        self.set_control("gain", value)
    }

    fn start(&mut self, mode: PlaybackMode) -> Result<(), DeviceError> {
        lock(&self.device.calls).mode = Some(mode);
        self.start_activity()
    }
}

impl PumpChannel for FakeHandle {
    fn on_stop(&mut self, listener: StopListener) {
        self.listener = Some(Arc::new(listener));
    }

    fn duty_range(&self) -> Option<ControlRange> {
        self.device.range
    }

    fn set_duty(&mut self, value: f32) -> Result<(), DeviceError> {
        self.set_control("duty", value)
    }

    fn start(&mut self) -> Result<(), DeviceError> {
        self.start_activity()
    }
}

pub(crate) struct FakeDirectory {
    devices: Mutex<Vec<FakeDevice>>,
    enumerations: AtomicUsize,
    fail_enumeration: bool,
}

impl FakeDirectory {
    pub fn with(devices: Vec<FakeDevice>) -> Self {
        Self {
            devices: Mutex::new(devices),
            enumerations: AtomicUsize::new(0),
            fail_enumeration: false,
        }
    }

    pub fn failing_enumeration() -> Self {
        Self {
            fail_enumeration: true,
            ..Self::with(Vec::new())
        }
    }

    pub fn attach(&self, device: FakeDevice) {
        lock(&self.devices).push(device);
    }

    pub fn enumerations(&self) -> usize {
        self.enumerations.load(Ordering::SeqCst)
    }

    fn open(
        &self,
        descriptor: &DeviceDescriptor,
        capability: Capability,
    ) -> Result<FakeHandle, DeviceError> {
        let device = lock(&self.devices)
            .iter()
            .find(|d| d.descriptor.name == descriptor.name && d.descriptor.supports(capability))
            .cloned()
            .ok_or_else(|| DeviceError::Unavailable {
                name: descriptor.name.clone(),
                source: "unplugged".into(),
            })?;
        if matches!(device.behaviour, Behaviour::FailOpen) {
            return Err(DeviceError::Unavailable {
                name: descriptor.name.clone(),
                source: "line busy".into(),
            });
        }
        device.record("open").opens += 1;
        Ok(FakeHandle {
            device,
            listener: None,
            fault: None,
        })
    }
}

impl DeviceDirectory for FakeDirectory {
    type Line = FakeHandle;
    type Channel = FakeHandle;

    fn devices(&self) -> Result<Vec<DeviceDescriptor>, DeviceError> {
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        if self.fail_enumeration {
            return Err(DeviceError::Enumeration("sound server not running".into()));
        }
        Ok(lock(&self.devices)
            .iter()
            .map(|d| d.descriptor.clone())
            .collect())
    }

    fn open_line(&self, device: &DeviceDescriptor) -> Result<FakeHandle, DeviceError> {
        self.open(device, Capability::AudioSource)
    }

    fn open_channel(&self, device: &DeviceDescriptor) -> Result<FakeHandle, DeviceError> {
        self.open(device, Capability::PumpDriver)
    }
}
