//! Diagnosis Diagnostic GOLD driver
//!
//! The meter speaks a framed binary protocol (see [`crate::protocol::frame`]).
//! A download goes:
//! 1. wait for the meter to announce itself with a frame starting `0x10`
//! 2. handshake `10 40`, answered with the record count and meter ids
//! 3. request `10 60` repeatedly, one record per answer, until the answer is
//!    shorter than a record

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::{Driver, DriverKind};
use crate::protocol::frame::{read_frame, write_frame};
use crate::protocol::{hexdump, DeviceError, Result, SerialSettings, SerialTransport, Transport};
use crate::reading::Reading;

/// Handshake request
pub const CMD_HANDSHAKE: [u8; 2] = [0x10, 0x40];
/// Next stored record request
pub const CMD_NEXT_RECORD: [u8; 2] = [0x10, 0x60];
/// First payload byte of the frame the meter sends when it is ready
pub const READY_OPCODE: u8 = 0x10;
/// Answers shorter than this mark the end of the stored records
pub const RECORD_LEN: usize = 17;
/// Size of the handshake answer
pub const HANDSHAKE_LEN: usize = 22;

/// Tunables for the GOLD download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldOptions {
    /// How long to wait for the meter to signal it is ready
    pub handshake_timeout: Duration,
}

impl Default for GoldOptions {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(5),
        }
    }
}

/// Meter identification returned by the handshake.
///
/// Kept for display only; none of it is validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandshakeInfo {
    /// Number of records the meter reports
    pub reading_count: u8,
    /// Three byte id code
    pub id_code: [u8; 3],
    /// Sixteen byte unique id
    pub uid: [u8; 16],
}

impl HandshakeInfo {
    /// Decode the handshake answer: 2 unused bytes, count, id code, UID
    pub fn parse(payload: &[u8]) -> Result<Self> {
        if payload.len() < HANDSHAKE_LEN {
            return Err(DeviceError::invalid(format!(
                "handshake answer too short: {} bytes",
                payload.len()
            )));
        }
        let mut id_code = [0u8; 3];
        id_code.copy_from_slice(&payload[3..6]);
        let mut uid = [0u8; 16];
        uid.copy_from_slice(&payload[6..22]);
        Ok(Self {
            reading_count: payload[2],
            id_code,
            uid,
        })
    }
}

/// Decode one stored record.
///
/// Layout: 2 unused, year since 2000, month, day, hour, minute, unused, value.
pub fn decode_record(payload: &[u8]) -> Result<Reading> {
    if payload.len() < 9 {
        return Err(DeviceError::invalid(format!(
            "record too short: {} bytes",
            payload.len()
        )));
    }
    let timestamp = record_timestamp(
        2000 + payload[2] as i32,
        payload[3] as u32,
        payload[4] as u32,
        payload[5] as u32,
        payload[6] as u32,
    )
    .ok_or_else(|| {
        DeviceError::invalid(format!("record has invalid date: {}", hexdump(&payload[2..7])))
    })?;
    Ok(Reading::glucose(payload[8] as u32, timestamp))
}

fn record_timestamp(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)
}

/// Driver for the Diagnosis Diagnostic GOLD meter
pub struct DiagnosticGold<T: Transport = SerialTransport> {
    transport: T,
    options: GoldOptions,
    handshake: Option<HandshakeInfo>,
}

impl DiagnosticGold<SerialTransport> {
    /// Open the meter at `path` with default settings
    pub fn open(path: &str) -> Result<Self> {
        Self::open_with(path, SerialSettings::GOLD, GoldOptions::default())
    }

    /// Open the meter at `path` with explicit settings
    pub fn open_with(path: &str, settings: SerialSettings, options: GoldOptions) -> Result<Self> {
        let transport = SerialTransport::open(path, settings)?;
        Ok(Self::with_options(transport, options))
    }
}

impl<T: Transport> DiagnosticGold<T> {
    /// Wrap an already open transport
    pub fn new(transport: T) -> Self {
        Self::with_options(transport, GoldOptions::default())
    }

    /// Wrap an already open transport with explicit options
    pub fn with_options(transport: T, options: GoldOptions) -> Self {
        Self {
            transport,
            options,
            handshake: None,
        }
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Result of the last successful handshake
    pub fn handshake_info(&self) -> Option<&HandshakeInfo> {
        self.handshake.as_ref()
    }

    /// Read one frame and return its payload
    pub fn read(&mut self) -> Result<Vec<u8>> {
        read_frame(&mut self.transport)
    }

    /// Send `payload` as one frame
    pub fn write(&mut self, payload: &[u8]) -> Result<()> {
        write_frame(&mut self.transport, payload)
    }

    /// Download every stored reading
    pub fn fetch_readings(&mut self) -> Result<Vec<Reading>> {
        self.wait_until_ready()?;

        debug!("Device found, doing handshake");
        let handshake = self.handshake()?;
        info!(
            readings = handshake.reading_count,
            id_code = %hexdump(&handshake.id_code),
            uid = %hexdump(&handshake.uid),
            "GOLD handshake complete"
        );
        self.handshake = Some(handshake);

        let mut readings = Vec::new();
        loop {
            self.write(&CMD_NEXT_RECORD)?;
            let data = self.read()?;
            if data.len() < RECORD_LEN {
                debug!("Reading finished");
                break;
            }
            readings.push(decode_record(&data)?);
        }

        Ok(readings)
    }

    /// Release the serial port
    pub fn close(&mut self) {
        self.transport.close();
    }

    /// Poll until the meter sends a frame starting with [`READY_OPCODE`].
    ///
    /// Only the opcode is checked. Any well-formed frame whose first byte is
    /// `0x10` counts as ready, which the protocol gives no way to tighten.
    fn wait_until_ready(&mut self) -> Result<()> {
        let deadline = Instant::now() + self.options.handshake_timeout;

        loop {
            match self.read() {
                Ok(payload) if payload.first() == Some(&READY_OPCODE) => return Ok(()),
                Ok(payload) => {
                    debug!("Ignoring frame while waiting for device: {}", hexdump(&payload));
                    if Instant::now() >= deadline {
                        return Err(DeviceError::not_connected(
                            "device never signalled it is ready",
                        ));
                    }
                }
                Err(DeviceError::NotConnected(msg)) => {
                    debug!("No device found... ({})", msg);
                    if Instant::now() >= deadline {
                        return Err(DeviceError::NotConnected(msg));
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn handshake(&mut self) -> Result<HandshakeInfo> {
        self.write(&CMD_HANDSHAKE)?;
        HandshakeInfo::parse(&self.read()?)
    }
}

impl<T: Transport> Driver for DiagnosticGold<T> {
    fn kind(&self) -> DriverKind {
        DriverKind::DiagnosticGold
    }

    fn fetch_readings(&mut self) -> Result<Vec<Reading>> {
        DiagnosticGold::fetch_readings(self)
    }

    fn close(&mut self) {
        DiagnosticGold::close(self)
    }
}
