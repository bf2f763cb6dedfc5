//! glucolib command-line front end
//!
//! Finds an attached meter, downloads its readings and writes them out for
//! import into other tools.

pub mod exit_codes;
pub mod export;
pub mod logging;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use glucolib_core::discovery::{list_devices, DriverBinding};
use glucolib_core::drivers::{Driver, DriverKind};
use glucolib_core::protocol::{DeviceError, DEFAULT_PORT};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

use crate::exit_codes::ExitCodes;
use crate::export::{write_readings, ExportFormat};

/// Shown on stderr whenever the meter misbehaves
pub const REPLUG_HINT: &str = "*** Make sure your device is connected properly and not sleeping \
(you may want to replug the connector in such case)";

/// Discovery found nothing to talk to
#[derive(Error, Debug)]
#[error("no supported devices found")]
pub struct NoSupportedDevices;

/// Meter model selectable on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Model {
    /// Diagnosis Diagnostic GOLD
    Gold,
    /// Abbott Optium Xido
    Xido,
}

impl From<Model> for DriverKind {
    fn from(model: Model) -> Self {
        match model {
            Model::Gold => DriverKind::DiagnosticGold,
            Model::Xido => DriverKind::OptiumXido,
        }
    }
}

/// Download readings from glucose meters
#[derive(Parser, Debug)]
#[command(name = "glucolib", version, about, long_about = None)]
pub struct Cli {
    /// Verbose output (protocol traces on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which device to talk to
#[derive(clap::Args, Debug, Clone, Default)]
pub struct DeviceArgs {
    /// Serial port of the meter (discovered when omitted)
    #[arg(short, long, env = "GLUCOLIB_PORT")]
    pub port: Option<String>,

    /// Meter model; skips discovery and opens --port directly
    #[arg(short, long, value_enum)]
    pub model: Option<Model>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List attached supported meters
    List,

    /// Download readings
    Export {
        #[command(flatten)]
        device: DeviceArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the meter's system values (serial number, version, clock)
    Info {
        #[command(flatten)]
        device: DeviceArgs,
    },
}

/// Decide which meter to open.
///
/// An explicit model opens the port directly (default port when none is
/// given). Otherwise the discovered meters are used, restricted to `--port`
/// when given.
pub fn select_binding(
    device: &DeviceArgs,
    discovered: &[DriverBinding],
) -> Result<DriverBinding, NoSupportedDevices> {
    if let Some(model) = device.model {
        return Ok(DriverBinding {
            port_path: device.port.clone().unwrap_or_else(|| DEFAULT_PORT.to_string()),
            kind: model.into(),
        });
    }

    discovered
        .iter()
        .find(|b| device.port.as_deref().map_or(true, |p| p == b.port_path))
        .cloned()
        .ok_or(NoSupportedDevices)
}

fn open_driver(device: &DeviceArgs) -> anyhow::Result<Box<dyn Driver>> {
    let discovered = if device.model.is_some() {
        Vec::new()
    } else {
        list_devices()
    };
    let binding = select_binding(device, &discovered)?;
    info!(port = %binding.port_path, model = %binding.kind, "opening device");
    Ok(binding.open()?)
}

fn list(out: &mut dyn Write) -> anyhow::Result<()> {
    let devices = list_devices();
    if devices.is_empty() {
        return Err(NoSupportedDevices.into());
    }
    for binding in devices {
        writeln!(out, "{}\t{}", binding.port_path, binding.kind)?;
    }
    Ok(())
}

fn export(device: &DeviceArgs, format: ExportFormat, output: Option<&PathBuf>) -> anyhow::Result<()> {
    let mut driver = open_driver(device)?;
    let result = driver.fetch_readings();
    driver.close();
    let readings = result?;
    info!(count = readings.len(), "readings downloaded");

    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut out = BufWriter::new(file);
            write_readings(&mut out, &readings, format)?;
            out.flush()?;
        }
        None => {
            let stdout = io::stdout();
            write_readings(&mut stdout.lock(), &readings, format)?;
        }
    }
    Ok(())
}

fn info(device: &DeviceArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let mut driver = open_driver(device)?;
    let result = driver.device_info();
    let kind = driver.kind();
    driver.close();

    match result? {
        Some(fields) => {
            for (name, values) in fields {
                writeln!(out, "{}: {}", name, values.join(", "))?;
            }
        }
        None => writeln!(out, "{} has no info query", kind)?,
    }
    Ok(())
}

/// Run a parsed command line
pub fn run(cli: &Cli) -> anyhow::Result<()> {
    let stdout = io::stdout();
    match &cli.command {
        Commands::List => list(&mut stdout.lock()),
        Commands::Export {
            device,
            format,
            output,
        } => export(device, *format, output.as_ref()),
        Commands::Info { device } => info(device, &mut stdout.lock()),
    }
}

/// Report a failed run on stderr and pick the exit code
pub fn report_error(err: &anyhow::Error) -> u8 {
    if let Some(device_err) = err.downcast_ref::<DeviceError>() {
        eprintln!("{}", REPLUG_HINT);
        eprintln!("*** Captured exception: {}", device_err);
        ExitCodes::for_device_error(device_err)
    } else if err.downcast_ref::<NoSupportedDevices>().is_some() {
        eprintln!("*** No supported devices found");
        ExitCodes::DEVICE_NOT_FOUND
    } else {
        eprintln!("*** Error: {:#}", err);
        ExitCodes::ERROR
    }
}
