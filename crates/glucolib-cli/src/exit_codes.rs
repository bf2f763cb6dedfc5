//! CLI Exit Codes

use glucolib_core::protocol::DeviceError;

/// Exit code constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCodes;

impl ExitCodes {
    /// Success
    pub const SUCCESS: u8 = 0;

    /// General error
    pub const ERROR: u8 = 1;

    /// Meter did not answer
    pub const CONNECTION_FAILED: u8 = 3;

    /// Meter answered with something malformed
    pub const PROTOCOL_ERROR: u8 = 9;

    /// No supported meter attached
    pub const DEVICE_NOT_FOUND: u8 = 12;

    /// Exit code for a device error
    pub fn for_device_error(err: &DeviceError) -> u8 {
        match err {
            DeviceError::NotConnected(_) => Self::CONNECTION_FAILED,
            DeviceError::Invalid(_) => Self::PROTOCOL_ERROR,
        }
    }
}
