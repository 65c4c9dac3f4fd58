//! Common error taxonomy for motion devices.
//!
//! Every capability operation returns `Result<T, MotionError>`. Vendor status
//! codes are converted into this taxonomy once, at the call site, by the
//! backend's status table. Nothing here is retried automatically.

use crate::channel::Channel;
use std::time::Duration;
use thiserror::Error;

/// Error kinds surfaced by motion devices.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MotionError {
    /// A vendor call returned a non-success status.
    #[error("Device error on {}: {message} (code {code})", channel_label(.channel))]
    Device {
        /// Channel the call addressed, if any
        channel: Option<Channel>,
        /// Raw vendor status code
        code: i32,
        /// Vendor-supplied message
        message: String,
    },

    /// A bounded wait exceeded its deadline.
    #[error("Timeout on channel {channel} after {}ms", .elapsed.as_millis())]
    Timeout {
        /// Channel being waited on
        channel: Channel,
        /// Time spent before giving up
        elapsed: Duration,
    },

    /// Invalid internal state (e.g. stop requested in an unknown command mode).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Input rejected before any vendor call was issued.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Capability invoked on a backend that does not implement it.
    #[error("{operation} is not supported by the {backend} backend")]
    NotSupported {
        /// Operation name
        operation: &'static str,
        /// Backend name
        backend: &'static str,
    },

    /// Operation attempted without a live vendor session.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Session initialization or teardown step failed.
    #[error("Device {step} failed: {source}")]
    Init {
        /// Name of the failed step (e.g. "start communication")
        step: &'static str,
        /// Underlying error
        source: Box<MotionError>,
    },
}

impl MotionError {
    /// Shorthand for a [`MotionError::InvalidParameter`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }

    /// Wrap an error as the failure of a named init/teardown step.
    pub fn at_step(self, step: &'static str) -> Self {
        Self::Init {
            step,
            source: Box::new(self),
        }
    }

    /// Returns true for [`MotionError::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns true for [`MotionError::NotSupported`].
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Self::NotSupported { .. })
    }
}

fn channel_label(channel: &Option<Channel>) -> String {
    match channel {
        Some(ch) => format!("channel {ch}"),
        None => "device".to_string(),
    }
}

/// Result alias used throughout the workspace.
pub type MotionResult<T> = Result<T, MotionError>;
