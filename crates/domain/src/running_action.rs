//! Running action — the execution context and log of one trigger invocation.
//!
//! A [`RunningAction`] is created fresh by the caller, handed mutably to the
//! engine for the duration of a trigger, and inspected afterwards. The engine
//! only appends to the log; nothing reads it back for control decisions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::{ActionError, FaultKind};
use crate::event_action::EventAction;
use crate::id::RunId;
use crate::time::{Timestamp, now};

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Error,
}

/// One chronological entry of a run's log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: Timestamp,
    pub level: LogLevel,
    pub message: String,
    /// Set when the entry records an [`ActionError`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fault: Option<FaultKind>,
}

/// Terminal (or current) state of a run, derived from its log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Succeeded,
    Failed,
}

type StopHook = Box<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct StopState {
    requested: AtomicBool,
    hook: Mutex<Option<StopHook>>,
}

/// Cloneable handle requesting that a run stop early.
///
/// Requests are sticky: a stop requested before the engine starts waiting
/// is honoured as soon as it does.
#[derive(Clone, Default)]
pub struct StopHandle {
    state: Arc<StopState>,
}

impl StopHandle {
    /// Request the run to stop. Repeated calls are harmless.
    pub fn stop(&self) {
        self.state.requested.store(true, Ordering::SeqCst);
        let hook = self
            .state
            .hook
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(hook) = hook.as_ref() {
            hook();
        }
    }

    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.state.requested.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for StopHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopHandle")
            .field("requested", &self.is_requested())
            .finish_non_exhaustive()
    }
}

/// Execution context and append-only log of a single invocation.
#[derive(Debug, Serialize)]
pub struct RunningAction {
    id: RunId,
    description: String,
    started_at: Timestamp,
    finished_at: Option<Timestamp>,
    log: Vec<LogEntry>,
    #[serde(skip)]
    stop: StopHandle,
}

impl RunningAction {
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id: RunId::new(),
            description: description.into(),
            started_at: now(),
            finished_at: None,
            log: Vec::new(),
            stop: StopHandle::default(),
        }
    }

    /// Create a context whose description snapshots `action`'s.
    #[must_use]
    pub fn for_action(action: &EventAction) -> Self {
        Self::new(action.description())
    }

    #[must_use]
    pub fn id(&self) -> RunId {
        self.id
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    #[must_use]
    pub fn finished_at(&self) -> Option<Timestamp> {
        self.finished_at
    }

    pub fn add_info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message.into(), None);
    }

    /// Record a failure as an error entry, including its source chain.
    pub fn add_error(&mut self, err: &ActionError) {
        self.push(LogLevel::Error, err.report(), Some(err.fault_kind()));
    }

    /// Record a failure that did not stop the action as an info entry.
    pub fn add_recovered(&mut self, err: &ActionError) {
        self.push(LogLevel::Info, err.report(), Some(err.fault_kind()));
    }

    fn push(&mut self, level: LogLevel, message: String, fault: Option<FaultKind>) {
        self.log.push(LogEntry {
            timestamp: now(),
            level,
            message,
            fault,
        });
    }

    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn errors(&self) -> impl Iterator<Item = &LogEntry> {
        self.log.iter().filter(|e| e.level == LogLevel::Error)
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Mark the run as finished. Only the first call records a time.
    pub fn finish(&mut self) {
        if self.finished_at.is_none() {
            self.finished_at = Some(now());
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    #[must_use]
    pub fn status(&self) -> RunStatus {
        if !self.is_finished() {
            RunStatus::Running
        } else if self.has_errors() {
            RunStatus::Failed
        } else {
            RunStatus::Succeeded
        }
    }

    /// Handle another thread may use to stop this run early.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.stop.is_requested()
    }

    /// Install the callback fired by [`StopHandle::stop`].
    ///
    /// Fires immediately when a stop was already requested. Replaces any
    /// previously installed hook.
    pub fn on_stop_requested(&self, hook: impl Fn() + Send + Sync + 'static) {
        let mut slot = self
            .stop
            .state
            .hook
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.stop.is_requested() {
            hook();
        }
        *slot = Some(Box::new(hook));
    }

    /// Drop the installed stop callback.
    pub fn clear_stop_hook(&self) {
        self.stop
            .state
            .hook
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}
