//! Cancelable one-shot timer thread.

use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, Sender};

/// Runs a callback on its own thread after a delay unless cancelled first.
pub(crate) struct Timer {
    cancel: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl Timer {
    pub fn start(after: Duration, on_elapsed: impl FnOnce() + Send + 'static) -> Self {
        let (cancel, rx) = crossbeam_channel::bounded(1);
        let thread = std::thread::spawn(move || {
            if let Err(RecvTimeoutError::Timeout) = rx.recv_timeout(after) {
                on_elapsed();
            }
        });
        Self {
            cancel,
            thread: Some(thread),
        }
    }

    /// Cancel the timer and wait for its thread to exit.
    pub fn cancel(mut self) {
        let _ = self.cancel.try_send(());
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            tracing::warn!("virtual timer callback panicked");
        }
    }
}
