//! Serial transport
//!
//! A duplex byte channel to one meter. Timeouts never raise: a read that runs
//! out of time simply comes back short (or empty), and the driver decides what
//! that means for its protocol.

use serialport::SerialPort;
use std::io::{self, Read, Write};
use tracing::debug;

use super::{DeviceError, Result, SerialSettings};

/// Byte channel a driver talks through
pub trait Transport {
    /// Read up to `n` bytes. Fewer (possibly zero) are returned when the
    /// device stops sending before the timeout expires.
    fn read_exact(&mut self, n: usize) -> Result<Vec<u8>>;

    /// Read one line including its terminator, or `None` when nothing arrived
    /// before the timeout. A line cut short by the timeout is returned as-is.
    fn read_line(&mut self) -> Result<Option<String>>;

    /// Send all of `data`
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Release the underlying device. Safe to call more than once.
    fn close(&mut self);

    /// Read lines until the device goes quiet
    fn read_lines(&mut self) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        while let Some(line) = self.read_line()? {
            lines.push(line);
        }
        Ok(lines)
    }
}

/// [`Transport`] over an OS serial port
pub struct SerialTransport {
    path: String,
    settings: SerialSettings,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Open `path` as 8N1 without flow control
    pub fn open(path: &str, settings: SerialSettings) -> Result<Self> {
        let port = serialport::new(path, settings.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(settings.read_timeout)
            .open()
            .map_err(|e| DeviceError::not_connected(format!("{}: {}", path, e)))?;

        debug!(
            port = path,
            baud = settings.baud_rate,
            "serial port opened"
        );

        Ok(Self {
            path: path.to_string(),
            settings,
            port: Some(port),
        })
    }

    /// Device path this transport was opened on
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether the OS handle is still held
    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn port(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        self.port
            .as_mut()
            .ok_or_else(|| DeviceError::not_connected("serial port is closed"))
    }
}

impl Transport for SerialTransport {
    fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        let settings = self.settings;
        let port = self.port()?;
        port.set_timeout(settings.read_timeout)?;

        let mut buf = vec![0u8; n];
        let mut filled = 0;
        while filled < n {
            let got = read_chunk(port, &mut buf[filled..])?;
            if got == 0 {
                break;
            }
            if filled == 0 {
                port.set_timeout(settings.inter_char_timeout)?;
            }
            filled += got;
        }
        buf.truncate(filled);
        Ok(buf)
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let settings = self.settings;
        let port = self.port()?;
        port.set_timeout(settings.read_timeout)?;

        let mut line = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            if read_chunk(port, &mut byte)? == 0 {
                break;
            }
            if line.is_empty() {
                port.set_timeout(settings.inter_char_timeout)?;
            }
            line.push(byte[0]);
            if byte[0] == b'\n' {
                break;
            }
        }

        if line.is_empty() {
            Ok(None)
        } else {
            Ok(Some(String::from_utf8_lossy(&line).into_owned()))
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        // No flush(): it issues tcdrain, and write_all already hands the bytes
        // to the kernel tty buffer.
        self.port()?.write_all(data)?;
        Ok(())
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            debug!(port = %self.path, "serial port closed");
        }
    }
}

/// Single read where a timeout counts as "no data" rather than an error
pub(crate) fn read_chunk<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e)
                if e.kind() == io::ErrorKind::TimedOut
                    || e.kind() == io::ErrorKind::WouldBlock =>
            {
                return Ok(0)
            }
            Err(e) => return Err(e),
        }
    }
}
