//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts via `#[from]`.
//! [`ActionError`] is the taxonomy recorded in a
//! [`RunningAction`](crate::running_action::RunningAction) log; it never
//! crosses the trigger boundary as a `Result`.

use serde::{Deserialize, Serialize};

/// Base error for domain-level operations (builders, lookups).
#[derive(Debug, thiserror::Error)]
pub enum MiniBarError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("device name must not be empty")]
    EmptyDeviceName,

    #[error("file name must not be empty")]
    EmptyFileName,

    #[error("duration must be greater than zero")]
    ZeroDuration,
}

/// A lookup that found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id:?} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Classification of a failure recorded while triggering an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// The configured device name matched no live device.
    DeviceNotFound,
    /// A requested control is not supported by the resolved device.
    Configuration,
    /// Any other failure while configuring, starting, or waiting.
    Execution,
}

/// Failure raised inside a trigger and downgraded to a log entry.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("device {name:?} not found")]
    DeviceNotFound { name: String },

    #[error("device {device:?} does not support {control}")]
    Configuration {
        control: &'static str,
        device: String,
    },

    #[error("action execution failed")]
    Execution(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ActionError {
    /// Wrap any error as an [`ActionError::Execution`].
    pub fn execution(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Execution(Box::new(err))
    }

    #[must_use]
    pub fn fault_kind(&self) -> FaultKind {
        match self {
            Self::DeviceNotFound { .. } => FaultKind::DeviceNotFound,
            Self::Configuration { .. } => FaultKind::Configuration,
            Self::Execution(_) => FaultKind::Execution,
        }
    }

    /// Render the error followed by its whole `source()` chain.
    #[must_use]
    pub fn report(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            out.push_str(": ");
            out.push_str(&err.to_string());
            source = err.source();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("outer")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn should_embed_device_name_in_not_found_message() {
        let err = ActionError::DeviceNotFound {
            name: "Nonexistent".to_string(),
        };
        assert_eq!(err.to_string(), "device \"Nonexistent\" not found");
        assert_eq!(err.fault_kind(), FaultKind::DeviceNotFound);
    }

    #[test]
    fn should_report_full_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated file");
        let err = ActionError::execution(Outer(io));
        assert_eq!(
            err.report(),
            "action execution failed: outer: truncated file"
        );
        assert_eq!(err.fault_kind(), FaultKind::Execution);
    }

    #[test]
    fn should_classify_configuration_error() {
        let err = ActionError::Configuration {
            control: "gain control",
            device: "Speaker".to_string(),
        };
        assert_eq!(err.fault_kind(), FaultKind::Configuration);
        assert_eq!(
            err.to_string(),
            "device \"Speaker\" does not support gain control"
        );
    }

    #[test]
    fn should_convert_validation_error_into_base_error() {
        let err: MiniBarError = ValidationError::EmptyFileName.into();
        assert!(matches!(
            err,
            MiniBarError::Validation(ValidationError::EmptyFileName)
        ));
    }

    #[test]
    fn should_display_not_found_error() {
        let err = NotFoundError {
            entity: "Action",
            id: "welcome".to_string(),
        };
        assert_eq!(err.to_string(), "Action \"welcome\" not found");
    }
}
