//! Completion gate — one-shot signal from a driver thread to the trigger thread.
//!
//! [`CompletionGate::new`] yields a cloneable [`CompletionSignal`] handed to
//! the driver's stop listener, and a [`CompletionWaiter`] the triggering
//! thread consumes with a single blocking wait. Only the first
//! [`fire`](CompletionSignal::fire) is delivered; later ones are no-ops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use minibar_domain::error::ActionError;

/// Why the gate opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateReason {
    /// The device's activity stopped.
    Completed,
    /// An external stop was requested for the run.
    StopRequested,
}

/// The wait could not be satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    /// Every signal was dropped before one fired.
    #[error("completion signal dropped before the device reported a stop")]
    Abandoned,
}

impl From<GateError> for ActionError {
    fn from(err: GateError) -> Self {
        ActionError::execution(err)
    }
}

struct Inner {
    fired: AtomicBool,
    tx: Sender<GateReason>,
}

/// Producer side of the gate.
#[derive(Clone)]
pub struct CompletionSignal {
    inner: Arc<Inner>,
}

impl CompletionSignal {
    /// Open the gate. Returns `true` only for the call that opened it.
    pub fn fire(&self, reason: GateReason) -> bool {
        fire(&self.inner, reason)
    }

    /// A handle that can fire the gate without keeping it alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakSignal {
        WeakSignal {
            inner: Arc::downgrade(&self.inner),
        }
    }

    #[must_use]
    pub fn is_fired(&self) -> bool {
        self.inner.fired.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for CompletionSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionSignal")
            .field("fired", &self.is_fired())
            .finish()
    }
}

/// Non-owning producer; does not prevent [`GateError::Abandoned`].
#[derive(Debug, Clone)]
pub struct WeakSignal {
    inner: Weak<Inner>,
}

impl WeakSignal {
    /// Open the gate if any strong signal is still alive.
    pub fn fire(&self, reason: GateReason) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inner| fire(&inner, reason))
    }
}

fn fire(inner: &Inner, reason: GateReason) -> bool {
    if inner.fired.swap(true, Ordering::AcqRel) {
        return false;
    }
    // capacity is one and only the first caller sends, so this never blocks
    let _ = inner.tx.try_send(reason);
    true
}

/// Consumer side of the gate; waits at most once.
#[derive(Debug)]
pub struct CompletionWaiter {
    rx: Receiver<GateReason>,
}

impl CompletionWaiter {
    /// Block until the gate opens.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Abandoned`] if every signal is dropped unfired.
    pub fn wait(self) -> Result<GateReason, GateError> {
        self.rx.recv().map_err(|_| GateError::Abandoned)
    }

    /// Block until the gate opens or `timeout` elapses (`Ok(None)`).
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Abandoned`] if every signal is dropped unfired.
    pub fn wait_timeout(self, timeout: Duration) -> Result<Option<GateReason>, GateError> {
        match self.rx.recv_timeout(timeout) {
            Ok(reason) => Ok(Some(reason)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(GateError::Abandoned),
        }
    }
}

/// Constructor namespace for the signal/waiter pair.
pub struct CompletionGate;

impl CompletionGate {
    #[allow(clippy::new_ret_no_self)]
    #[must_use]
    pub fn new() -> (CompletionSignal, CompletionWaiter) {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let signal = CompletionSignal {
            inner: Arc::new(Inner {
                fired: AtomicBool::new(false),
                tx,
            }),
        };
        (signal, CompletionWaiter { rx })
    }
}
