//! Meter drivers
//!
//! Each supported meter model gets a driver speaking its wire protocol over a
//! [`Transport`](crate::protocol::Transport). Callers use them through the
//! common [`Driver`] trait; which one to build is decided by [`DriverKind`],
//! normally picked by [`discovery`](crate::discovery).

pub mod gold;
pub mod xido;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::protocol::Result;
use crate::reading::Reading;

pub use gold::{DiagnosticGold, GoldOptions, HandshakeInfo};
pub use xido::OptiumXido;

/// Field name to values, as reported by a meter's info query
pub type DeviceInfo = BTreeMap<String, Vec<String>>;

/// Operations every meter driver supports
pub trait Driver {
    /// Which model this driver talks to
    fn kind(&self) -> DriverKind;

    /// Download every stored reading. Fails as a whole; a partially
    /// downloaded list is never returned.
    fn fetch_readings(&mut self) -> Result<Vec<Reading>>;

    /// Model specific system values, `None` when the model has no info query
    fn device_info(&mut self) -> Result<Option<DeviceInfo>> {
        Ok(None)
    }

    /// Release the serial port. Safe to call more than once.
    fn close(&mut self);
}

/// Supported meter models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DriverKind {
    /// Diagnosis Diagnostic GOLD, binary framed protocol
    DiagnosticGold,
    /// Abbott Optium Xido, ASCII command protocol
    OptiumXido,
}

impl DriverKind {
    /// Every supported model
    pub fn all() -> &'static [DriverKind] {
        &[DriverKind::DiagnosticGold, DriverKind::OptiumXido]
    }

    /// Marketing name of the model
    pub fn name(&self) -> &'static str {
        match self {
            DriverKind::DiagnosticGold => "Diagnosis Diagnostic GOLD",
            DriverKind::OptiumXido => "Abbott Optium Xido",
        }
    }

    /// Open the serial port at `path` with this model's settings
    pub fn open(&self, path: &str) -> Result<Box<dyn Driver>> {
        Ok(match self {
            DriverKind::DiagnosticGold => Box::new(DiagnosticGold::open(path)?),
            DriverKind::OptiumXido => Box::new(OptiumXido::open(path)?),
        })
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
