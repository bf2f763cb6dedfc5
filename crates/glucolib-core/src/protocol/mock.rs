//! Scripted transport for exercising drivers without hardware
//!
//! Inbound data is queued up front. Running out of queued data, or hitting a
//! queued silence, behaves like a read timeout: the read comes back short.

use std::collections::VecDeque;

use super::{DeviceError, Result, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Inbound {
    Byte(u8),
    Silence,
}

/// In-memory [`Transport`] with queued responses and captured writes
#[derive(Debug, Default)]
pub struct MockTransport {
    inbound: VecDeque<Inbound>,
    written: Vec<u8>,
    close_count: usize,
}

impl MockTransport {
    /// Empty transport: every read times out
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes the "device" will send
    pub fn push_bytes(&mut self, data: &[u8]) -> &mut Self {
        self.inbound.extend(data.iter().copied().map(Inbound::Byte));
        self
    }

    /// Queue lines, each terminated with CR LF
    pub fn push_lines<S: AsRef<str>>(&mut self, lines: &[S]) -> &mut Self {
        for line in lines {
            self.push_bytes(line.as_ref().as_bytes());
            self.push_bytes(b"\r\n");
        }
        self
    }

    /// Queue one read timeout
    pub fn push_silence(&mut self) -> &mut Self {
        self.inbound.push_back(Inbound::Silence);
        self
    }

    /// Everything written so far
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Inbound bytes not yet consumed
    pub fn pending(&self) -> usize {
        self.inbound
            .iter()
            .filter(|i| matches!(i, Inbound::Byte(_)))
            .count()
    }

    /// Number of times `close` actually released the device
    pub fn close_count(&self) -> usize {
        self.close_count
    }

    /// Whether the transport has been closed
    pub fn is_closed(&self) -> bool {
        self.close_count > 0
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(DeviceError::not_connected("transport is closed"))
        } else {
            Ok(())
        }
    }
}

impl Transport for MockTransport {
    fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        self.ensure_open()?;
        let mut out = Vec::with_capacity(n);
        while out.len() < n {
            match self.inbound.pop_front() {
                Some(Inbound::Byte(b)) => out.push(b),
                Some(Inbound::Silence) | None => break,
            }
        }
        Ok(out)
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        self.ensure_open()?;
        let mut line = Vec::new();
        loop {
            match self.inbound.pop_front() {
                Some(Inbound::Byte(b)) => {
                    line.push(b);
                    if b == b'\n' {
                        break;
                    }
                }
                Some(Inbound::Silence) | None => break,
            }
        }
        if line.is_empty() {
            Ok(None)
        } else {
            Ok(Some(String::from_utf8_lossy(&line).into_owned()))
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.ensure_open()?;
        self.written.extend_from_slice(data);
        Ok(())
    }

    fn close(&mut self) {
        if !self.is_closed() {
            self.close_count += 1;
        }
    }
}
