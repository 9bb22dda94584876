//! Core error types for hourish-core.
//!
//! Every error here is local and recoverable. The scheduler never surfaces
//! errors from its background clock task; those are absorbed by a forced stop.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for hourish-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Scheduler command rejected
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Plan file errors
    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    /// The clock driver needs a Tokio runtime to spawn onto
    #[error("No Tokio runtime available to drive the session clock")]
    RuntimeUnavailable,
}

/// Errors returned by the countdown scheduler's public commands.
///
/// A failed command leaves the scheduler exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// `start` called with no items
    #[error("Cannot start a session with no tasks")]
    EmptySchedule,

    /// `start` called while a session is running or draining
    #[error("A session is already active")]
    AlreadyActive,

    /// Command not allowed in the current phase
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Two input records share the same order value
    #[error("Duplicate order value {order} (tasks '{first}' and '{second}')")]
    DuplicateOrder {
        order: i64,
        first: String,
        second: String,
    },

    /// Duration is negative, NaN or infinite
    #[error("Invalid duration for task '{title}': {value}")]
    InvalidDuration { title: String, value: String },

    /// Running session without an active item or start instant
    #[error("Inconsistent session state: {0}")]
    InconsistentState(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Plan file errors.
#[derive(Error, Debug)]
pub enum PlanError {
    /// Plan file could not be read
    #[error("Failed to read plan {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Plan file is not valid TOML or has the wrong shape
    #[error("Failed to parse plan: {0}")]
    ParseFailed(#[from] toml::de::Error),

    /// Plan contents are unusable
    #[error("Invalid plan: {0}")]
    Invalid(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_error_converts_into_core_error() {
        let err: CoreError = SchedulerError::EmptySchedule.into();
        assert!(matches!(err, CoreError::Scheduler(SchedulerError::EmptySchedule)));
        assert_eq!(
            err.to_string(),
            "Scheduler error: Cannot start a session with no tasks"
        );
    }

    #[test]
    fn config_and_plan_errors_convert_into_core_error() {
        let err: CoreError = ConfigError::UnknownKey("session.bogus".into()).into();
        assert_eq!(
            err.to_string(),
            "Configuration error: Unknown configuration key: session.bogus"
        );
        let err: CoreError = PlanError::Invalid("plan name is empty".into()).into();
        assert!(matches!(err, CoreError::Plan(PlanError::Invalid(_))));
    }

    #[test]
    fn duplicate_order_message_names_both_tasks() {
        let err = SchedulerError::DuplicateOrder {
            order: 3,
            first: "Read".into(),
            second: "Write".into(),
        };
        assert_eq!(
            err.to_string(),
            "Duplicate order value 3 (tasks 'Read' and 'Write')"
        );
    }
}
