//! Abbott Optium Xido driver
//!
//! Line oriented ASCII protocol: the host sends `$cmd\r\n` and the meter
//! answers with lines until it goes quiet.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::debug;

use super::{DeviceInfo, Driver, DriverKind};
use crate::protocol::{DeviceError, Result, SerialSettings, SerialTransport, Transport};
use crate::reading::{Reading, ReadingKind};

/// Dump stored readings
pub const CMD_READINGS: &str = "$xmem";
/// Query system values (serial number, software version, clock)
pub const CMD_INFO: &str = "$colq";
/// Last line of a successful `$colq` answer
pub const CMD_OK: &str = "CMD OK";

/// Index of the line holding the reading count in the `$xmem` answer
const COUNT_LINE: usize = 4;

/// Month abbreviations as the meter prints them, January first
const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Driver for the Abbott Optium Xido meter
pub struct OptiumXido<T: Transport = SerialTransport> {
    transport: T,
}

impl OptiumXido<SerialTransport> {
    /// Open the meter at `path` with default settings
    pub fn open(path: &str) -> Result<Self> {
        Self::open_with(path, SerialSettings::XIDO)
    }

    /// Open the meter at `path` with explicit settings
    pub fn open_with(path: &str, settings: SerialSettings) -> Result<Self> {
        Ok(Self::new(SerialTransport::open(path, settings)?))
    }
}

impl<T: Transport> OptiumXido<T> {
    /// Wrap an already open transport
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send `cmd` and collect the trimmed answer lines.
    ///
    /// No answer at all means the meter is unplugged or asleep; replugging
    /// the cable wakes it up.
    pub fn command(&mut self, cmd: &str) -> Result<Vec<String>> {
        debug!("--> {}", cmd);
        self.transport.write(format!("{}\r\n", cmd).as_bytes())?;

        let lines: Vec<String> = self
            .transport
            .read_lines()?
            .iter()
            .map(|l| l.trim().to_string())
            .collect();

        if lines.is_empty() {
            return Err(DeviceError::not_connected("device not responding"));
        }
        debug!("<-- {} lines", lines.len());
        Ok(lines)
    }

    /// Download every stored reading
    pub fn fetch_readings(&mut self) -> Result<Vec<Reading>> {
        let lines = self.command(CMD_READINGS)?;
        parse_readings(&lines)
    }

    /// Query system values such as `S/N`, `Ver` and `Clock`
    pub fn device_info(&mut self) -> Result<DeviceInfo> {
        let lines = self.command(CMD_INFO)?;
        parse_device_info(&lines)
    }

    /// Release the serial port
    pub fn close(&mut self) {
        self.transport.close();
    }
}

impl<T: Transport> Driver for OptiumXido<T> {
    fn kind(&self) -> DriverKind {
        DriverKind::OptiumXido
    }

    fn fetch_readings(&mut self) -> Result<Vec<Reading>> {
        OptiumXido::fetch_readings(self)
    }

    fn device_info(&mut self) -> Result<Option<DeviceInfo>> {
        OptiumXido::device_info(self).map(Some)
    }

    fn close(&mut self) {
        OptiumXido::close(self)
    }
}

/// Parse a `$xmem` answer.
///
/// The first line is always empty on a genuine meter, line 4 holds the count
/// and the records follow as `value month day year time kind unused`.
pub fn parse_readings<S: AsRef<str>>(lines: &[S]) -> Result<Vec<Reading>> {
    match lines.first() {
        Some(first) if first.as_ref().is_empty() => {}
        _ => return Err(DeviceError::invalid("readings answer does not start with a blank line")),
    }

    let count_line = lines
        .get(COUNT_LINE)
        .ok_or_else(|| DeviceError::invalid("readings answer has no count line"))?
        .as_ref();
    let count: usize = count_line
        .parse()
        .map_err(|_| DeviceError::invalid(format!("bad reading count {:?}", count_line)))?;

    let records = (COUNT_LINE + 1)
        .checked_add(count)
        .and_then(|end| lines.get(COUNT_LINE + 1..end))
        .ok_or_else(|| {
            DeviceError::invalid(format!(
                "meter announced {} readings but sent {}",
                count,
                lines.len().saturating_sub(COUNT_LINE + 1)
            ))
        })?;

    records.iter().map(|r| parse_record(r.as_ref())).collect()
}

fn parse_record(line: &str) -> Result<Reading> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let &[value, month, day, year, time, kind, _] = fields.as_slice() else {
        return Err(DeviceError::invalid(format!(
            "expected 7 fields in reading {:?}",
            line
        )));
    };

    let value: u32 = value
        .parse()
        .map_err(|_| DeviceError::invalid(format!("bad reading value {:?}", value)))?;
    let timestamp = parse_timestamp(month, day, year, time)?;
    Ok(Reading::new(ReadingKind::from_code(kind), value, timestamp))
}

/// Parse `Mar 05 2014 09:30` style dates.
///
/// Month names come from a fixed English table, so the result never depends on
/// the host locale.
pub fn parse_timestamp(month: &str, day: &str, year: &str, time: &str) -> Result<NaiveDateTime> {
    let bad = || DeviceError::invalid(format!("bad timestamp {} {} {} {}", month, day, year, time));

    let month = MONTH_ABBREVIATIONS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(month))
        .ok_or_else(bad)? as u32
        + 1;
    let day: u32 = day.parse().map_err(|_| bad())?;
    if year.len() != 4 {
        return Err(bad());
    }
    let year: i32 = year.parse().map_err(|_| bad())?;
    let time = NaiveTime::parse_from_str(time, "%H:%M").map_err(|_| bad())?;

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(bad)?;
    Ok(date.and_time(time))
}

/// Parse a `$colq` answer into field name to values.
///
/// Each line is `Name:<TAB>value<TAB>value...`; the final line must be
/// `CMD OK`.
pub fn parse_device_info<S: AsRef<str>>(lines: &[S]) -> Result<DeviceInfo> {
    let (last, fields) = lines
        .split_last()
        .ok_or_else(|| DeviceError::invalid("empty info answer"))?;
    if last.as_ref() != CMD_OK {
        return Err(DeviceError::invalid(format!(
            "info answer ended with {:?} instead of {:?}",
            last.as_ref(),
            CMD_OK
        )));
    }

    Ok(fields
        .iter()
        .map(|line| {
            let line = line.as_ref();
            let name = line.split(':').next().unwrap_or_default().to_string();
            let values = line.split('\t').skip(1).map(str::to_string).collect();
            (name, values)
        })
        .collect())
}
