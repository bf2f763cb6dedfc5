use chrono::{NaiveDate, NaiveDateTime};
use clap::Parser;
use glucolib_cli::exit_codes::ExitCodes;
use glucolib_cli::export::{write_csv, write_readings, ExportFormat, CSV_HEADER};
use glucolib_cli::{report_error, select_binding, Cli, Commands, DeviceArgs, Model, NoSupportedDevices};
use glucolib_core::discovery::DriverBinding;
use glucolib_core::drivers::DriverKind;
use glucolib_core::protocol::{DeviceError, DEFAULT_PORT};
use glucolib_core::reading::{Reading, ReadingKind};
use pretty_assertions::assert_eq;
use std::io::Write;

fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, 0)
        .unwrap()
}

fn sample_readings() -> Vec<Reading> {
    vec![
        Reading::glucose(100, ts(2014, 3, 5, 9, 30)),
        Reading::new(ReadingKind::Other("K".into()), 3, ts(2014, 3, 5, 10, 0)),
        Reading::glucose(142, ts(2014, 3, 5, 13, 15)),
    ]
}

fn binding(port: &str, kind: DriverKind) -> DriverBinding {
    DriverBinding {
        port_path: port.to_string(),
        kind,
    }
}

#[test]
fn test_csv_export_filters_glucose() {
    let mut out = Vec::new();
    write_csv(&mut out, &sample_readings()).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert_eq!(
        text.lines().collect::<Vec<_>>(),
        vec![
            CSV_HEADER,
            r#""100","","03/05/2014","09:30 AM","""#,
            r#""142","","03/05/2014","01:15 PM","""#,
        ]
    );
}

#[test]
fn test_csv_export_empty() {
    let mut out = Vec::new();
    write_csv(&mut out, &[]).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), format!("{}\n", CSV_HEADER));
}

#[test]
fn test_json_export() {
    let mut out = Vec::new();
    write_readings(&mut out, &sample_readings(), ExportFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

    let items = value.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["kind"], "G");
    assert_eq!(items[0]["value"], 100);
    assert_eq!(items[0]["timestamp"], "2014-03-05T09:30:00");
}

#[test]
fn test_export_to_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write_readings(file.as_file_mut(), &sample_readings(), ExportFormat::Csv).unwrap();
    file.flush().unwrap();

    let text = std::fs::read_to_string(file.path()).unwrap();
    assert!(text.starts_with(CSV_HEADER));
    assert_eq!(text.lines().count(), 3);
}

#[test]
fn test_parse_export_args() {
    let cli = Cli::try_parse_from([
        "glucolib", "export", "--port", "/dev/ttyUSB3", "--model", "gold", "--format", "json",
    ])
    .unwrap();
    match cli.command {
        Commands::Export { device, format, output } => {
            assert_eq!(device.port.as_deref(), Some("/dev/ttyUSB3"));
            assert_eq!(device.model, Some(Model::Gold));
            assert_eq!(format, ExportFormat::Json);
            assert!(output.is_none());
        }
        other => panic!("unexpected command {:?}", other),
    }
}

#[test]
fn test_model_opens_default_port() {
    let device = DeviceArgs {
        port: None,
        model: Some(Model::Xido),
    };
    assert_eq!(
        select_binding(&device, &[]).unwrap(),
        binding(DEFAULT_PORT, DriverKind::OptiumXido)
    );
}

#[test]
fn test_discovery_picks_first_or_requested_port() {
    let discovered = vec![
        binding("/dev/ttyUSB0", DriverKind::OptiumXido),
        binding("/dev/ttyUSB1", DriverKind::DiagnosticGold),
    ];

    let any = DeviceArgs::default();
    assert_eq!(select_binding(&any, &discovered).unwrap(), discovered[0]);

    let second = DeviceArgs {
        port: Some("/dev/ttyUSB1".to_string()),
        model: None,
    };
    assert_eq!(select_binding(&second, &discovered).unwrap(), discovered[1]);

    let missing = DeviceArgs {
        port: Some("/dev/ttyUSB9".to_string()),
        model: None,
    };
    assert!(select_binding(&missing, &discovered).is_err());
    assert!(select_binding(&any, &[]).is_err());
}

#[test]
fn test_exit_codes() {
    let not_connected = anyhow::Error::from(DeviceError::not_connected("device not responding"));
    assert_eq!(report_error(&not_connected), ExitCodes::CONNECTION_FAILED);

    let invalid = anyhow::Error::from(DeviceError::invalid("bad checksum"));
    assert_eq!(report_error(&invalid), ExitCodes::PROTOCOL_ERROR);

    let none = anyhow::Error::from(NoSupportedDevices);
    assert_eq!(report_error(&none), ExitCodes::DEVICE_NOT_FOUND);

    let other = anyhow::anyhow!("disk full");
    assert_eq!(report_error(&other), ExitCodes::ERROR);
}
