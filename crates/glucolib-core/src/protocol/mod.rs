//! Serial Protocol Communication
//!
//! Shared plumbing for the meter drivers: the error type, the XOR checksum and
//! binary frame codec used by the Gold protocol, the serial transport and
//! serial port enumeration.

pub mod checksum;
mod error;
pub mod frame;
pub mod mock;
pub mod serial;
pub mod transport;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use checksum::checksum;
pub use error::{DeviceError, Result};
pub use frame::Frame;
pub use serial::{list_ports, PortInfo};
pub use transport::{SerialTransport, Transport};

/// Default serial device used when the caller does not name one
#[cfg(not(windows))]
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";
/// Default serial device used when the caller does not name one
#[cfg(windows)]
pub const DEFAULT_PORT: &str = "COM1";

/// How a serial transport is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialSettings {
    /// Line speed
    pub baud_rate: u32,
    /// Time to wait for the first byte of a read
    pub read_timeout: Duration,
    /// Maximum gap between consecutive bytes of one read
    pub inter_char_timeout: Duration,
}

impl SerialSettings {
    /// Diagnosis GOLD: 38400 8N1, 1s read timeout
    pub const GOLD: SerialSettings = SerialSettings {
        baud_rate: 38400,
        read_timeout: Duration::from_secs(1),
        inter_char_timeout: Duration::from_millis(100),
    };

    /// Abbott Optium Xido: 19200 8N1, 100ms read timeout
    pub const XIDO: SerialSettings = SerialSettings {
        baud_rate: 19200,
        read_timeout: Duration::from_millis(100),
        inter_char_timeout: Duration::from_millis(100),
    };
}

/// Render bytes as space separated upper-case hex pairs (`53 20 0A`)
pub fn hexdump(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
