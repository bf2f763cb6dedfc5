//! Reading export formats
//!
//! CSV follows the GlucoseTracker import layout:
//! `"Value","Category","Date","Time","Notes"`, with US date and 12 hour time.

use clap::ValueEnum;
use glucolib_core::reading::Reading;
use std::io::{self, Write};

/// Header line of the CSV export
pub const CSV_HEADER: &str = r#""Value","Category","Date","Time","Notes""#;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// GlucoseTracker compatible CSV
    Csv,
    /// JSON array of readings
    Json,
}

/// One CSV line for a reading
pub fn csv_line(reading: &Reading) -> String {
    let ts = reading.timestamp();
    format!(
        r#""{}","","{}","{}","""#,
        reading.value(),
        ts.format("%m/%d/%Y"),
        ts.format("%I:%M %p")
    )
}

/// Write the glucose readings as CSV, header first
pub fn write_csv<W: Write>(out: &mut W, readings: &[Reading]) -> io::Result<()> {
    writeln!(out, "{}", CSV_HEADER)?;
    for reading in readings.iter().filter(|r| r.is_glucose()) {
        writeln!(out, "{}", csv_line(reading))?;
    }
    Ok(())
}

/// Write the glucose readings as a pretty printed JSON array
pub fn write_json<W: Write>(out: &mut W, readings: &[Reading]) -> io::Result<()> {
    let glucose: Vec<&Reading> = readings.iter().filter(|r| r.is_glucose()).collect();
    serde_json::to_writer_pretty(&mut *out, &glucose)?;
    writeln!(out)
}

/// Write readings in the chosen format
pub fn write_readings<W: Write>(
    out: &mut W,
    readings: &[Reading],
    format: ExportFormat,
) -> io::Result<()> {
    match format {
        ExportFormat::Csv => write_csv(out, readings),
        ExportFormat::Json => write_json(out, readings),
    }
}
