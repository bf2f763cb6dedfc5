//! Device errors

use thiserror::Error;

/// Errors raised while talking to a meter.
///
/// There are only two kinds: the device did not answer, or it answered with
/// something that does not follow its protocol.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// No or empty response within the timeout, or the port could not be opened
    #[error("Device not connected: {0}")]
    NotConnected(String),

    /// Structurally malformed response
    #[error("Invalid device response: {0}")]
    Invalid(String),
}

impl DeviceError {
    /// Shorthand for [`DeviceError::NotConnected`]
    pub fn not_connected(msg: impl Into<String>) -> Self {
        DeviceError::NotConnected(msg.into())
    }

    /// Shorthand for [`DeviceError::Invalid`]
    pub fn invalid(msg: impl Into<String>) -> Self {
        DeviceError::Invalid(msg.into())
    }

    /// Whether replugging the device and trying again may help
    pub fn is_retryable(&self) -> bool {
        matches!(self, DeviceError::NotConnected(_))
    }
}

impl From<serialport::Error> for DeviceError {
    fn from(err: serialport::Error) -> Self {
        DeviceError::NotConnected(err.to_string())
    }
}

impl From<std::io::Error> for DeviceError {
    fn from(err: std::io::Error) -> Self {
        DeviceError::NotConnected(err.to_string())
    }
}

/// Result alias used throughout the protocol layer
pub type Result<T> = std::result::Result<T, DeviceError>;
