//! `RunPump` trigger.

use std::time::Instant;

use minibar_domain::device::Capability;
use minibar_domain::error::ActionError;
use minibar_domain::event_action::RunPumpAction;
use minibar_domain::running_action::RunningAction;

use crate::completion::{CompletionGate, GateReason};
use crate::lease::DeviceLease;
use crate::ports::devices::Releasable;
use crate::ports::{DeviceDirectory, DeviceError, PumpChannel};
use crate::resolver::resolve;

pub(super) fn trigger<D: DeviceDirectory>(
    directory: &D,
    action: &RunPumpAction,
    running: &mut RunningAction,
) -> Result<(), ActionError> {
    let Some(device) = resolve(directory, action.pump_device(), Capability::PumpDriver)? else {
        return Err(ActionError::DeviceNotFound {
            name: action.pump_device().to_string(),
        });
    };

    let mut channel = DeviceLease::new(&device.name, directory.open_channel(&device)?);
    let (signal, waiter) = CompletionGate::new();
    let on_stop = signal.clone();
    channel.on_stop(Box::new(move || {
        on_stop.fire(GateReason::Completed);
    }));

    apply_power(&mut *channel, action.power(), &device.name, running)?;

    super::forward_stop_requests(running, signal.downgrade());
    let stopped_early = signal.is_fired();
    drop(signal);

    let started = Instant::now();
    if !stopped_early {
        channel.start()?;
        tracing::debug!(device = %device.name, duration_ms = action.duration_ms(), "pump started");
        running.add_info(format!("Pump {} started", channel.device()));
    }

    let reason = waiter.wait_timeout(action.duration())?;
    if let Some(fault) = channel.take_fault() {
        return Err(fault.into());
    }
    match reason {
        None => running.add_info(format!("Pump ran for {}ms", action.duration_ms())),
        Some(GateReason::Completed) => {
            let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            tracing::warn!(device = %device.name, elapsed_ms = elapsed, "pump stopped before its duration");
            running.add_info(format!("Pump stopped by driver after {elapsed}ms"));
        }
        Some(GateReason::StopRequested) => running.add_info("Stopped on request"),
    }
    channel.release();
    Ok(())
}

fn apply_power<C: PumpChannel>(
    channel: &mut C,
    power: u16,
    device: &str,
    running: &mut RunningAction,
) -> Result<(), DeviceError> {
    let Some(range) = channel.duty_range() else {
        let err = ActionError::Configuration {
            control: "duty control",
            device: device.to_string(),
        };
        tracing::warn!(%err, "running the pump at its default duty");
        running.add_recovered(&err);
        return Ok(());
    };
    let duty = range.map_percent(f32::from(power));
    channel.set_duty(duty)?;
    running.add_info(format!("Power set to {power}% (duty {duty:.1})"));
    Ok(())
}
