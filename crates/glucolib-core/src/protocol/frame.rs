//! Gold binary frame codec
//!
//! Frame format:
//! - 1 byte: start marker (0x53)
//! - 1 byte: direction (0x10 host to meter, 0x20 meter to host)
//! - 1 byte: length (payload length + 2)
//! - N bytes: payload
//! - 1 byte: XOR checksum of the payload only
//! - 1 byte: end marker (0xAA)

use tracing::debug;

use super::{checksum, hexdump, DeviceError, Result, Transport};

/// Start of frame marker
pub const START_BYTE: u8 = 0x53;
/// End of frame marker
pub const END_BYTE: u8 = 0xAA;
/// Direction byte for frames sent by the host
pub const DIRECTION_HOST: u8 = 0x10;
/// Direction byte for frames sent by the meter
pub const DIRECTION_DEVICE: u8 = 0x20;

/// Largest payload that still fits the one-byte length field
pub const MAX_PAYLOAD: usize = u8::MAX as usize - 2;

/// One binary protocol message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Who sent the frame
    pub direction: u8,
    /// Frame payload
    pub payload: Vec<u8>,
    /// XOR of the payload
    pub checksum: u8,
}

impl Frame {
    /// Build a host-to-meter frame around `payload`
    pub fn request(payload: &[u8]) -> Result<Self> {
        if payload.len() > MAX_PAYLOAD {
            return Err(DeviceError::invalid(format!(
                "payload of {} bytes does not fit in a frame",
                payload.len()
            )));
        }
        Ok(Self {
            direction: DIRECTION_HOST,
            payload: payload.to_vec(),
            checksum: checksum(payload),
        })
    }

    /// Encode the frame to raw bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.encoded_size());
        bytes.push(START_BYTE);
        bytes.push(self.direction);
        bytes.push((self.payload.len() + 2) as u8);
        bytes.extend_from_slice(&self.payload);
        bytes.push(self.checksum);
        bytes.push(END_BYTE);
        bytes
    }

    /// Get the total encoded size
    pub fn encoded_size(&self) -> usize {
        self.payload.len() + 5
    }
}

/// Send `payload` to the meter as a single frame
pub fn write_frame<T: Transport + ?Sized>(transport: &mut T, payload: &[u8]) -> Result<()> {
    let frame = Frame::request(payload)?;
    let bytes = frame.to_bytes();
    debug!("--> {} // {}", hexdump(payload), hexdump(&bytes));
    transport.write(&bytes)
}

/// Read one meter-to-host frame and return its payload.
///
/// Silence (or a 0x00 line-idle byte) where the start marker should be is a
/// connectivity fault; anything else out of place makes the frame invalid.
pub fn read_frame<T: Transport + ?Sized>(transport: &mut T) -> Result<Vec<u8>> {
    let start = transport.read_exact(1)?;
    match start.first() {
        None | Some(0x00) => return Err(DeviceError::not_connected("device not responding")),
        Some(&START_BYTE) => {}
        Some(other) => {
            return Err(DeviceError::invalid(format!(
                "bad start byte {:#04x}",
                other
            )))
        }
    }

    let direction = read_byte(transport, "direction")?;
    if direction != DIRECTION_DEVICE {
        return Err(DeviceError::invalid(format!(
            "bad direction byte {:#04x}",
            direction
        )));
    }

    let length = read_byte(transport, "length")? as usize;
    if length < 2 {
        return Err(DeviceError::invalid(format!("bad length byte {}", length)));
    }

    let payload = transport.read_exact(length - 2)?;
    if payload.len() != length - 2 {
        return Err(DeviceError::invalid(format!(
            "truncated payload: expected {} bytes, got {}",
            length - 2,
            payload.len()
        )));
    }

    let received = read_byte(transport, "checksum")?;
    let expected = checksum(&payload);
    if received != expected {
        return Err(DeviceError::invalid(format!(
            "bad checksum: expected {:#04x}, got {:#04x}",
            expected, received
        )));
    }

    let end = read_byte(transport, "end")?;
    if end != END_BYTE {
        return Err(DeviceError::invalid(format!("bad end byte {:#04x}", end)));
    }

    debug!("<-- {}", hexdump(&payload));
    Ok(payload)
}

fn read_byte<T: Transport + ?Sized>(transport: &mut T, field: &str) -> Result<u8> {
    transport
        .read_exact(1)?
        .first()
        .copied()
        .ok_or_else(|| DeviceError::invalid(format!("frame truncated before {} byte", field)))
}
