//! `PlayAudio` trigger.

use minibar_domain::device::Capability;
use minibar_domain::error::ActionError;
use minibar_domain::event_action::PlayAudioAction;
use minibar_domain::running_action::RunningAction;

use crate::completion::{CompletionGate, GateReason};
use crate::lease::DeviceLease;
use crate::ports::devices::Releasable;
use crate::ports::{AudioLine, DeviceDirectory, DeviceError, PlaybackMode};
use crate::resolver::resolve;

pub(super) fn trigger<D: DeviceDirectory>(
    directory: &D,
    action: &PlayAudioAction,
    running: &mut RunningAction,
) -> Result<(), ActionError> {
    let Some(device) = resolve(directory, action.sound_device(), Capability::AudioSource)? else {
        return Err(ActionError::DeviceNotFound {
            name: action.sound_device().to_string(),
        });
    };

    let mut line = DeviceLease::new(&device.name, directory.open_line(&device)?);
    let (signal, waiter) = CompletionGate::new();
    let on_stop = signal.clone();
    line.on_stop(Box::new(move || {
        on_stop.fire(GateReason::Completed);
    }));

    line.load(action.file().as_bytes())?;
    tracing::debug!(device = %device.name, bytes = action.file().len(), "clip loaded");
    apply_volume(&mut *line, action.volume(), &device.name, running)?;

    super::forward_stop_requests(running, signal.downgrade());
    let stopped_early = signal.is_fired();
    // from here only the line's listener keeps the gate alive
    drop(signal);

    if !stopped_early {
        let mode = if action.on_repeat() {
            PlaybackMode::Loop
        } else {
            PlaybackMode::Once
        };
        line.start(mode)?;
        tracing::debug!(device = %device.name, ?mode, "playback started");
        running.add_info(format!(
            "Playing {} on {}",
            action.file_name(),
            line.device()
        ));
    }

    let reason = waiter.wait()?;
    if let Some(fault) = line.take_fault() {
        return Err(fault.into());
    }
    match reason {
        GateReason::Completed => running.add_info("Playback finished"),
        GateReason::StopRequested => running.add_info("Stopped on request"),
    }
    line.release();
    Ok(())
}

fn apply_volume<L: AudioLine>(
    line: &mut L,
    volume: u16,
    device: &str,
    running: &mut RunningAction,
) -> Result<(), DeviceError> {
    let Some(range) = line.gain_range() else {
        let err = ActionError::Configuration {
            control: "gain control",
            device: device.to_string(),
        };
        tracing::warn!(%err, "playing at the line's current volume");
        running.add_recovered(&err);
        return Ok(());
    };
    let gain = range.map_percent(f32::from(volume));
    line.set_gain(gain)?;
    running.add_info(format!("Volume set to {volume}% (gain {gain:.1})"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use minibar_domain::error::FaultKind;
    use minibar_domain::event_action::EventAction;
    use minibar_domain::running_action::{LogLevel, RunStatus};

    use crate::engine::ActionEngine;
    use crate::testing::{Behaviour, FakeDevice, FakeDirectory};

    use super::*;

    fn action(device: &str, volume: u16) -> PlayAudioAction {
        PlayAudioAction::builder()
            .sound_device(device)
            .file_name("welcome.wav")
            .file(vec![0x52, 0x49, 0x46, 0x46])
            .volume(volume)
            .build()
            .unwrap()
    }

    fn run(directory: &FakeDirectory, action: &PlayAudioAction) -> (Result<(), ActionError>, RunningAction) {
        let mut running = RunningAction::new(action.description());
        let result = trigger(directory, action, &mut running);
        (result, running)
    }

    #[test]
    fn should_map_volume_onto_gain_range_and_release_line() {
        let speaker = FakeDevice::speaker("USB Speaker");
        let dir = FakeDirectory::with(vec![speaker.clone()]);

        let (result, running) = run(&dir, &action("USB Speaker", 50));

        assert!(result.is_ok());
        assert!(!running.has_errors());
        let calls = speaker.calls();
        let gain = calls.gain.unwrap();
        assert!((gain - -17.0).abs() < 1e-4, "gain was {gain}");
        assert_eq!((calls.opens, calls.closes), (1, 1));
        assert_eq!(calls.mode, Some(PlaybackMode::Once));
        assert_eq!(
            calls.events,
            ["open", "load", "gain", "start", "stop", "close"]
        );
    }

    #[test]
    fn should_block_until_playback_ends() {
        let speaker = FakeDevice::speaker("USB Speaker")
            .with_behaviour(Behaviour::CompleteAfter(Duration::from_millis(50)));
        let dir = FakeDirectory::with(vec![speaker.clone()]);

        let started = Instant::now();
        let (result, running) = run(&dir, &action("USB Speaker", 50));

        assert!(result.is_ok());
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert_eq!(running.entries().last().unwrap().message, "Playback finished");
    }

    #[test]
    fn should_report_device_not_found_without_opening_anything() {
        let speaker = FakeDevice::speaker("USB Speaker");
        let engine = ActionEngine::new(FakeDirectory::with(vec![speaker.clone()]));

        let running = engine.run(&EventAction::from(action("Nonexistent", 50)));

        assert_eq!(running.error_count(), 1);
        let entry = running.errors().next().unwrap();
        assert_eq!(entry.fault, Some(FaultKind::DeviceNotFound));
        assert!(entry.message.contains("Nonexistent"));
        assert_eq!(speaker.calls().opens, 0);
    }

    #[test]
    fn should_clamp_volume_above_hundred_to_range_max() {
        let speaker = FakeDevice::speaker("USB Speaker");
        let dir = FakeDirectory::with(vec![speaker.clone()]);

        let (result, _) = run(&dir, &action("USB Speaker", 150));

        assert!(result.is_ok());
        assert_eq!(speaker.calls().gain, Some(6.0));
    }

    #[test]
    fn should_continue_without_gain_control() {
        let speaker = FakeDevice::speaker("USB Speaker").with_range(None);
        let dir = FakeDirectory::with(vec![speaker.clone()]);

        let (result, running) = run(&dir, &action("USB Speaker", 50));

        assert!(result.is_ok());
        assert!(!running.has_errors());
        let entry = &running.entries()[0];
        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.fault, Some(FaultKind::Configuration));
        assert!(entry.message.contains("gain control"));
        let calls = speaker.calls();
        assert_eq!(calls.gain, None);
        assert_eq!(calls.starts, 1);
    }

    #[test]
    fn should_release_line_once_when_load_fails() {
        let speaker = FakeDevice::speaker("USB Speaker").with_behaviour(Behaviour::FailLoad);
        let dir = FakeDirectory::with(vec![speaker.clone()]);

        let (result, _) = run(&dir, &action("USB Speaker", 50));

        let err = result.unwrap_err();
        assert_eq!(err.fault_kind(), FaultKind::Execution);
        assert!(err.report().contains("not a RIFF file"));
        let calls = speaker.calls();
        assert_eq!((calls.starts, calls.stops, calls.closes), (0, 1, 1));
    }

    #[test]
    fn should_log_one_error_and_release_line_when_gain_is_rejected() {
        let speaker = FakeDevice::speaker("USB Speaker").with_behaviour(Behaviour::FailGain);
        let engine = ActionEngine::new(FakeDirectory::with(vec![speaker.clone()]));

        let running = engine.run(&EventAction::from(action("USB Speaker", 50)));

        assert_eq!(running.error_count(), 1);
        assert!(running.errors().next().unwrap().message.contains("gain -17 rejected"));
        let calls = speaker.calls();
        assert_eq!((calls.starts, calls.stops, calls.closes), (0, 1, 1));
    }

    #[test]
    fn should_log_driver_fault_reported_after_start() {
        let speaker = FakeDevice::speaker("USB Speaker").with_behaviour(Behaviour::FaultOnStart);
        let engine = ActionEngine::new(FakeDirectory::with(vec![speaker.clone()]));

        let running = engine.run(&EventAction::from(action("USB Speaker", 50)));

        assert_eq!(running.status(), RunStatus::Failed);
        assert_eq!(running.error_count(), 1);
        let entry = running.errors().next().unwrap();
        assert_eq!(entry.fault, Some(FaultKind::Execution));
        assert!(entry.message.contains("device unplugged mid-run"));
        assert!(running.entries().iter().all(|e| e.message != "Playback finished"));
        let calls = speaker.calls();
        assert_eq!((calls.stops, calls.closes), (1, 1));
    }

    #[test]
    fn should_release_line_once_when_start_fails() {
        let speaker = FakeDevice::speaker("USB Speaker").with_behaviour(Behaviour::FailStart);
        let dir = FakeDirectory::with(vec![speaker.clone()]);

        let (result, _) = run(&dir, &action("USB Speaker", 50));

        assert!(result.unwrap_err().report().contains("refused to start"));
        let calls = speaker.calls();
        assert_eq!((calls.stops, calls.closes), (1, 1));
    }

    #[test]
    fn should_report_open_failure_as_execution_fault() {
        let speaker = FakeDevice::speaker("USB Speaker").with_behaviour(Behaviour::FailOpen);
        let dir = FakeDirectory::with(vec![speaker.clone()]);

        let (result, _) = run(&dir, &action("USB Speaker", 50));

        let err = result.unwrap_err();
        assert_eq!(err.fault_kind(), FaultKind::Execution);
        assert!(err.report().contains("line busy"));
        assert_eq!(speaker.calls().opens, 0);
    }

    #[test]
    fn should_fail_when_line_drops_its_listener() {
        let speaker =
            FakeDevice::speaker("USB Speaker").with_behaviour(Behaviour::DropListenerOnStart);
        let dir = FakeDirectory::with(vec![speaker.clone()]);

        let (result, _) = run(&dir, &action("USB Speaker", 50));

        assert!(result.unwrap_err().report().contains("signal dropped"));
        assert_eq!(speaker.calls().closes, 1);
    }

    #[test]
    fn should_loop_until_stop_is_requested() {
        let speaker = FakeDevice::speaker("USB Speaker").with_behaviour(Behaviour::NeverComplete);
        let engine = ActionEngine::new(FakeDirectory::with(vec![speaker.clone()]));
        let action: EventAction = PlayAudioAction::builder()
            .sound_device("USB Speaker")
            .file_name("jingle.wav")
            .on_repeat(true)
            .build()
            .unwrap()
            .into();
        let mut running = RunningAction::for_action(&action);

        let handle = running.stop_handle();
        let stopper = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            handle.stop();
        });
        engine.trigger(&action, &mut running);
        stopper.join().unwrap();

        assert_eq!(running.status(), RunStatus::Succeeded);
        assert_eq!(running.entries().last().unwrap().message, "Stopped on request");
        let calls = speaker.calls();
        assert_eq!(calls.mode, Some(PlaybackMode::Loop));
        assert_eq!((calls.stops, calls.closes), (1, 1));
    }

    #[test]
    fn should_skip_start_when_stop_requested_before_trigger() {
        let speaker = FakeDevice::speaker("USB Speaker").with_behaviour(Behaviour::NeverComplete);
        let dir = FakeDirectory::with(vec![speaker.clone()]);
        let action = action("USB Speaker", 50);
        let mut running = RunningAction::new(action.description());
        running.stop_handle().stop();

        let result = trigger(&dir, &action, &mut running);

        assert!(result.is_ok());
        assert_eq!(running.entries().last().unwrap().message, "Stopped on request");
        let calls = speaker.calls();
        assert_eq!((calls.starts, calls.closes), (0, 1));
    }

    #[test]
    fn should_find_device_plugged_in_between_triggers() {
        let dir = FakeDirectory::with(Vec::new());
        let action = action("Late Speaker", 50);

        let (first, _) = run(&dir, &action);
        assert!(matches!(first, Err(ActionError::DeviceNotFound { .. })));

        dir.attach(FakeDevice::speaker("Late Speaker"));
        let (second, _) = run(&dir, &action);
        assert!(second.is_ok());
    }
}
