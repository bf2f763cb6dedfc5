//! # glucolib Core Library
//!
//! Downloads stored blood glucose readings from handheld meters over their
//! USB serial cable.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Serial transport with read timeouts used as end-of-answer signals
//! - The Diagnosis Diagnostic GOLD binary protocol
//! - The Abbott Optium Xido ASCII protocol
//! - Discovery of attached meters by USB vendor/product id
//!
//! ## Supported meters
//!
//! - Diagnosis Diagnostic GOLD (CP210x cable, `10c4:ea60`)
//! - Abbott Optium Xido (`1a61:3420`)
//!
//! ## Example
//!
//! ```rust,no_run
//! use glucolib_core::discovery::list_devices;
//!
//! for binding in list_devices() {
//!     let mut driver = binding.open()?;
//!     for reading in driver.fetch_readings()? {
//!         println!("{} {} {}", reading.timestamp(), reading.kind(), reading.value());
//!     }
//!     driver.close();
//! }
//! # Ok::<(), glucolib_core::protocol::DeviceError>(())
//! ```

pub mod discovery;
pub mod drivers;
pub mod protocol;
pub mod reading;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::discovery::{list_devices, DriverBinding};
    pub use crate::drivers::{DeviceInfo, DiagnosticGold, Driver, DriverKind, OptiumXido};
    pub use crate::protocol::{DeviceError, SerialSettings, Transport};
    pub use crate::reading::{Reading, ReadingKind};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
