//! Error types for the monitor layer.

use dirwatch_core::{ConfigError, ScanError};
use thiserror::Error;

/// Errors raised by [`Monitor`](crate::Monitor) and [`Scheduler`](crate::Scheduler).
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("scheduler is already running")]
    AlreadyRunning,

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error(transparent)]
    Scan(#[from] ScanError),
}

impl MonitorError {
    /// Create an invalid-config error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

impl From<ConfigError> for MonitorError {
    fn from(err: ConfigError) -> Self {
        Self::InvalidConfig {
            message: err.message,
        }
    }
}
