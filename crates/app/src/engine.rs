//! Action engine — triggers event actions against the injected device directory.
//!
//! [`ActionEngine::trigger`] is synchronous: it returns once the action's
//! physical effect has completed or failed. It never returns an error;
//! every failure is appended to the [`RunningAction`] log, and any opened
//! device has been released by the time it returns.

mod play_audio;
mod run_pump;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use minibar_domain::error::ActionError;
use minibar_domain::event_action::EventAction;
use minibar_domain::running_action::RunningAction;

use crate::completion::{GateReason, WeakSignal};
use crate::ports::DeviceDirectory;

/// A panic escaped a device driver during a trigger.
#[derive(Debug, thiserror::Error)]
#[error("action panicked: {0}")]
struct Panicked(String);

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Route the run's external stop requests into the gate.
fn forward_stop_requests(running: &RunningAction, signal: WeakSignal) {
    running.on_stop_requested(move || {
        signal.fire(GateReason::StopRequested);
    });
}

/// Synchronous executor of [`EventAction`]s.
pub struct ActionEngine<D> {
    directory: D,
}

impl<D: DeviceDirectory> ActionEngine<D> {
    /// Create a new engine over the given device directory.
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    /// The injected device directory.
    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Execute `action`, recording its outcome in `running`.
    ///
    /// Blocks until the device reports completion, the run's
    /// [`StopHandle`](minibar_domain::running_action::StopHandle) is used,
    /// or a failure occurs. `running` is marked finished on return.
    #[tracing::instrument(skip(self, action, running), fields(run_id = %running.id(), action = %action, capability = %action.capability()))]
    pub fn trigger(&self, action: &EventAction, running: &mut RunningAction) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match action {
            EventAction::PlayAudio(a) => play_audio::trigger(&self.directory, a, running),
            EventAction::RunPump(a) => run_pump::trigger(&self.directory, a, running),
        }));

        let failure = match outcome {
            Ok(result) => result.err(),
            Err(payload) => Some(ActionError::execution(Panicked(panic_message(
                payload.as_ref(),
            )))),
        };
        if let Some(err) = failure {
            tracing::error!(error = %err.report(), device = action.device_name(), "action failed");
            running.add_error(&err);
        }

        running.clear_stop_hook();
        running.finish();
        tracing::info!(
            status = ?running.status(),
            errors = running.error_count(),
            stopped = running.is_stop_requested(),
            "action finished"
        );
    }

    /// Create a fresh [`RunningAction`], trigger `action` with it, and
    /// return it for inspection.
    pub fn run(&self, action: &EventAction) -> RunningAction {
        let mut running = RunningAction::for_action(action);
        self.trigger(action, &mut running);
        running
    }
}
