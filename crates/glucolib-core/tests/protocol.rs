use chrono::{NaiveDate, NaiveDateTime};
use glucolib_core::drivers::gold::{CMD_HANDSHAKE, CMD_NEXT_RECORD};
use glucolib_core::drivers::{DiagnosticGold, Driver, DriverKind, GoldOptions, OptiumXido};
use glucolib_core::protocol::frame::{read_frame, Frame, DIRECTION_DEVICE};
use glucolib_core::protocol::mock::MockTransport;
use glucolib_core::protocol::{checksum, DeviceError};
use glucolib_core::reading::{Reading, ReadingKind};
use pretty_assertions::assert_eq;
use std::time::Duration;

fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, 0)
        .unwrap()
}

/// Frame as the meter would send it
fn meter_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = Frame::request(payload).unwrap();
    frame.direction = DIRECTION_DEVICE;
    frame.to_bytes()
}

fn gold_record(year: u8, month: u8, day: u8, hour: u8, minute: u8, value: u8) -> Vec<u8> {
    let mut payload = vec![0, 0, year, month, day, hour, minute, 0, value];
    payload.resize(17, 0xee);
    payload
}

fn gold_session(records: &[Vec<u8>]) -> MockTransport {
    let mut mock = MockTransport::new();
    let mut handshake = vec![0x10, 0x40, records.len() as u8, 0x01, 0x02, 0x03];
    handshake.extend([0x55; 16]);

    mock.push_bytes(&meter_frame(&[0x10, 0x20]))
        .push_bytes(&meter_frame(&handshake));
    for record in records {
        mock.push_bytes(&meter_frame(record));
    }
    mock.push_bytes(&meter_frame(&[0x10]));
    mock
}

#[test]
fn test_written_frames_decode() {
    for payload in [vec![], vec![0x10, 0x40], vec![0x10, 0x60], (0u8..=200).collect()] {
        let mut bytes = Frame::request(&payload).unwrap().to_bytes();
        assert_eq!(bytes[bytes.len() - 2], checksum(&payload));

        bytes[1] = DIRECTION_DEVICE;
        let mut mock = MockTransport::new();
        mock.push_bytes(&bytes);
        assert_eq!(read_frame(&mut mock).unwrap(), payload);
    }
}

#[test]
fn test_gold_download() {
    let mock = gold_session(&[
        gold_record(14, 3, 5, 9, 30, 100),
        gold_record(14, 3, 5, 13, 0, 142),
        gold_record(15, 1, 1, 0, 0, 255),
    ]);
    let mut gold = DiagnosticGold::new(mock);

    assert_eq!(
        gold.fetch_readings().unwrap(),
        vec![
            Reading::glucose(100, ts(2014, 3, 5, 9, 30)),
            Reading::glucose(142, ts(2014, 3, 5, 13, 0)),
            Reading::glucose(255, ts(2015, 1, 1, 0, 0)),
        ]
    );

    let info = gold.handshake_info().unwrap();
    assert_eq!(info.reading_count, 3);
    assert_eq!(info.id_code, [1, 2, 3]);

    let handshake = Frame::request(&CMD_HANDSHAKE).unwrap().to_bytes();
    let next = Frame::request(&CMD_NEXT_RECORD).unwrap().to_bytes();
    assert_eq!(&gold.transport().written()[..handshake.len()], handshake.as_slice());
    assert_eq!(
        gold.transport().written().len(),
        handshake.len() + 4 * next.len()
    );
}

#[test]
fn test_gold_empty_meter() {
    let mut gold = DiagnosticGold::new(gold_session(&[]));
    assert!(gold.fetch_readings().unwrap().is_empty());
}

#[test]
fn test_gold_waits_through_silence() {
    let mut mock = MockTransport::new();
    for _ in 0..5 {
        mock.push_silence();
    }
    mock.push_bytes(&meter_frame(&[0x10]));
    let mut handshake = vec![0, 0, 0, 0, 0, 0];
    handshake.extend([0; 16]);
    mock.push_bytes(&meter_frame(&handshake))
        .push_bytes(&meter_frame(&[]));

    let mut gold = DiagnosticGold::with_options(
        mock,
        GoldOptions {
            handshake_timeout: Duration::from_secs(2),
        },
    );
    assert_eq!(gold.fetch_readings().unwrap(), vec![]);
}

#[test]
fn test_gold_gives_up_after_deadline() {
    let mut gold = DiagnosticGold::with_options(
        MockTransport::new(),
        GoldOptions {
            handshake_timeout: Duration::from_millis(10),
        },
    );
    let err = gold.fetch_readings().unwrap_err();
    assert!(err.is_retryable());
}

#[test]
fn test_xido_download() {
    let mut mock = MockTransport::new();
    mock.push_lines(&[
        "",
        "P0 MGGF123-A1234",
        "1.21",
        "Mar 05 2014 10:00",
        "3",
        "100 Mar 05 2014 09:30 G 0",
        " 98  Mar 04 2014 21:15 G 0 ",
        "5 Feb 28 2014 07:00 K 0",
        "END",
    ]);
    let mut xido = OptiumXido::new(mock);
    let readings = xido.fetch_readings().unwrap();

    assert_eq!(
        readings,
        vec![
            Reading::glucose(100, ts(2014, 3, 5, 9, 30)),
            Reading::glucose(98, ts(2014, 3, 4, 21, 15)),
            Reading::new(ReadingKind::Other("K".into()), 5, ts(2014, 2, 28, 7, 0)),
        ]
    );
    assert_eq!(xido.transport().written(), b"$xmem\r\n");
}

#[test]
fn test_xido_noise_is_invalid() {
    let mut mock = MockTransport::new();
    mock.push_lines(&["garbage", "", "", "", "0"]);
    let mut xido = OptiumXido::new(mock);
    assert!(matches!(
        xido.fetch_readings(),
        Err(DeviceError::Invalid(_))
    ));
}

#[test]
fn test_xido_bad_record_fails_whole_fetch() {
    let mut mock = MockTransport::new();
    mock.push_lines(&[
        "",
        "",
        "",
        "",
        "2",
        "100 Mar 05 2014 09:30 G 0",
        "abc Mar 05 2014 09:30 G 0",
    ]);
    let mut xido = OptiumXido::new(mock);
    assert!(matches!(
        xido.fetch_readings(),
        Err(DeviceError::Invalid(_))
    ));
}

#[test]
fn test_drivers_share_one_interface() {
    let mut xido_mock = MockTransport::new();
    xido_mock.push_lines(&["", "", "", "", "1", "100 Mar 05 2014 09:30 G 0"]);

    let mut drivers: Vec<Box<dyn Driver>> = vec![
        Box::new(DiagnosticGold::new(gold_session(&[gold_record(14, 3, 5, 9, 30, 100)]))),
        Box::new(OptiumXido::new(xido_mock)),
    ];

    let kinds: Vec<DriverKind> = drivers.iter().map(|d| d.kind()).collect();
    assert_eq!(kinds, vec![DriverKind::DiagnosticGold, DriverKind::OptiumXido]);

    for driver in drivers.iter_mut() {
        let readings = driver.fetch_readings().unwrap();
        assert_eq!(readings, vec![Reading::glucose(100, ts(2014, 3, 5, 9, 30))]);
        driver.close();
        driver.close();
    }
}

#[test]
fn test_gold_has_no_info_query() {
    let mut gold: Box<dyn Driver> = Box::new(DiagnosticGold::new(MockTransport::new()));
    assert_eq!(gold.device_info().unwrap(), None);
}

#[test]
fn test_error_display() {
    let err = DeviceError::invalid("bad checksum");
    assert_eq!(err.to_string(), "Invalid device response: bad checksum");
    let err = DeviceError::not_connected("device not responding");
    assert_eq!(err.to_string(), "Device not connected: device not responding");
}
