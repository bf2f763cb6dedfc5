//! Normalized meter readings

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::fmt;

/// What a reading measures, keyed by the meters' single-letter code
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReadingKind {
    /// Blood glucose (`G`)
    Glucose,
    /// A code this library does not know yet
    Other(String),
}

impl ReadingKind {
    /// Map a device code to a kind
    pub fn from_code(code: &str) -> Self {
        match code {
            "G" => ReadingKind::Glucose,
            other => ReadingKind::Other(other.to_string()),
        }
    }

    /// Device code (`G` for glucose)
    pub fn code(&self) -> &str {
        match self {
            ReadingKind::Glucose => "G",
            ReadingKind::Other(code) => code,
        }
    }

    /// Human readable name
    pub fn label(&self) -> &str {
        match self {
            ReadingKind::Glucose => "Glucose",
            ReadingKind::Other(_) => "Unknown",
        }
    }
}

impl fmt::Display for ReadingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for ReadingKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// One stored measurement.
///
/// `value` is in device units (mg/dL for glucose) and only meaningful together
/// with `kind`. The timestamp is the meter's local clock, no timezone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reading {
    kind: ReadingKind,
    value: u32,
    timestamp: NaiveDateTime,
}

impl Reading {
    /// Create a new reading
    pub fn new(kind: ReadingKind, value: u32, timestamp: NaiveDateTime) -> Self {
        Self {
            kind,
            value,
            timestamp,
        }
    }

    /// Glucose reading
    pub fn glucose(value: u32, timestamp: NaiveDateTime) -> Self {
        Self::new(ReadingKind::Glucose, value, timestamp)
    }

    /// What was measured
    pub fn kind(&self) -> &ReadingKind {
        &self.kind
    }

    /// Measured value in device units
    pub fn value(&self) -> u32 {
        self.value
    }

    /// When the meter recorded it
    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// Whether this is a glucose reading
    pub fn is_glucose(&self) -> bool {
        self.kind == ReadingKind::Glucose
    }
}
