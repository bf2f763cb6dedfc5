//! Device discovery
//!
//! Matches the host's serial ports against the USB ids of supported meters.
//! Nothing is opened here; [`DriverBinding::open`] does that on request.

use serde::Serialize;
use tracing::{debug, info};

use crate::drivers::{Driver, DriverKind};
use crate::protocol::{list_ports, PortInfo, Result};

/// A USB vendor/product id pair and the driver that handles it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportedDevice {
    /// Lower-case 4 digit hex vendor id
    pub vendor_id: &'static str,
    /// Lower-case 4 digit hex product id
    pub product_id: &'static str,
    /// Driver for the meter behind this cable
    pub kind: DriverKind,
}

/// Registry of supported meters.
///
/// Ordered: when a descriptor matches more than one entry the first wins.
pub const SUPPORTED_DEVICES: &[SupportedDevice] = &[
    SupportedDevice {
        vendor_id: "1a61",
        product_id: "3420",
        kind: DriverKind::OptiumXido,
    },
    SupportedDevice {
        vendor_id: "10c4",
        product_id: "ea60",
        kind: DriverKind::DiagnosticGold,
    },
];

/// A port and its hardware id string, as seen during enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Device path (e.g. "/dev/ttyUSB0")
    pub port_path: String,
    /// Hardware id, e.g. `USB VID:PID=10C4:EA60 SER=0001`
    pub hardware_id: String,
}

impl DeviceDescriptor {
    /// Descriptor from a path and hardware id string
    pub fn new(port_path: impl Into<String>, hardware_id: impl Into<String>) -> Self {
        Self {
            port_path: port_path.into(),
            hardware_id: hardware_id.into(),
        }
    }
}

impl From<&PortInfo> for DeviceDescriptor {
    fn from(port: &PortInfo) -> Self {
        Self::new(port.name.clone(), port.hardware_id())
    }
}

/// A discovered meter: which port, which driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverBinding {
    /// Device path the meter is attached to
    pub port_path: String,
    /// Driver to talk to it with
    pub kind: DriverKind,
}

impl DriverBinding {
    /// Open the port and build the driver. The returned driver owns the port
    /// until it is closed; open each binding at most once at a time.
    pub fn open(&self) -> Result<Box<dyn Driver>> {
        self.kind.open(&self.port_path)
    }
}

/// First registry entry whose vendor and product ids both appear in the
/// hardware id, compared case-insensitively
pub fn match_descriptor(descriptor: &DeviceDescriptor) -> Option<&'static SupportedDevice> {
    let hwid = descriptor.hardware_id.to_lowercase();
    SUPPORTED_DEVICES
        .iter()
        .find(|dev| hwid.contains(dev.vendor_id) && hwid.contains(dev.product_id))
}

/// Bind every descriptor that matches a supported meter
pub fn match_devices(descriptors: &[DeviceDescriptor]) -> Vec<DriverBinding> {
    descriptors
        .iter()
        .filter_map(|descriptor| {
            let dev = match_descriptor(descriptor);
            debug!(
                port = %descriptor.port_path,
                hwid = %descriptor.hardware_id,
                matched = dev.is_some(),
                "checked port"
            );
            dev.map(|dev| DriverBinding {
                port_path: descriptor.port_path.clone(),
                kind: dev.kind,
            })
        })
        .collect()
}

/// Enumerate serial ports and return the supported meters attached to them
pub fn list_devices() -> Vec<DriverBinding> {
    let descriptors: Vec<DeviceDescriptor> =
        list_ports().iter().map(DeviceDescriptor::from).collect();
    let bindings = match_devices(&descriptors);
    for binding in &bindings {
        info!(port = %binding.port_path, model = %binding.kind, "found supported device");
    }
    bindings
}
