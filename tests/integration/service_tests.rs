//! Integration tests for the ProbeService command pipeline.
//!
//! Drives the service through mock sensor, storage and sink adapters the
//! same way the firmware main loop does.

use crate::mock_hw::{MockEeprom, MockProbe, RecordingSink};

use phprobe::app::commands::{CommandOutcome, ProbeCommand};
use phprobe::app::events::CalibrationEvent;
use phprobe::app::ports::StorageError;
use phprobe::app::service::ProbeService;
use phprobe::config::ProbeConfig;
use phprobe::error::{CalibrationError, Error, SensorError};
use phprobe::{BufferPoint, CalibrationConstants};

fn started(config: ProbeConfig) -> (ProbeService, MockEeprom, RecordingSink) {
    let mut eeprom = MockEeprom::erased(64);
    let mut sink = RecordingSink::new();
    let mut svc = ProbeService::new(config);
    svc.start(&mut eeprom, &mut sink);
    (svc, eeprom, sink)
}

#[test]
fn start_reports_seeded_constants() {
    let (_, _, sink) = started(ProbeConfig::default());
    assert_eq!(
        sink.last(),
        Some(&CalibrationEvent::Report(CalibrationConstants::default()))
    );
}

#[test]
fn calibrate_before_first_tick_is_an_error() {
    let (mut svc, mut eeprom, mut sink) = started(ProbeConfig::default());

    let result = svc.handle_command(
        ProbeCommand::Calibrate(BufferPoint::Neutral),
        &mut eeprom,
        &mut sink,
    );

    assert_eq!(result, Err(Error::Sensor(SensorError::NoSample)));
}

#[test]
fn calibrate_uses_latest_tick() {
    let (mut svc, mut eeprom, mut sink) = started(ProbeConfig::default());
    let mut probe = MockProbe::at(1200.0);
    svc.tick(&mut probe, &mut sink);
    probe.millivolts = 1515.0;
    svc.tick(&mut probe, &mut sink);

    let outcome = svc
        .handle_command(
            ProbeCommand::Calibrate(BufferPoint::Neutral),
            &mut eeprom,
            &mut sink,
        )
        .expect("sample available");

    assert_eq!(outcome, CommandOutcome::Accepted);
    assert_eq!(svc.calibrator().neutral_mv(), 1515.0);
    assert_eq!(svc.tick_count(), 2);
}

#[test]
fn out_of_window_calibration_is_rejected() {
    let (mut svc, mut eeprom, mut sink) = started(ProbeConfig::default());
    svc.tick(&mut MockProbe::at(1500.0), &mut sink);

    let outcome = svc
        .handle_command(
            ProbeCommand::Calibrate(BufferPoint::Acidic),
            &mut eeprom,
            &mut sink,
        )
        .expect("sample available");

    assert_eq!(outcome, CommandOutcome::Rejected);
    assert_eq!(svc.calibrator().constants(), CalibrationConstants::default());
}

#[test]
fn safe_mode_off_in_config_accepts_any_reading() {
    let config = ProbeConfig {
        safe_mode: false,
        ..Default::default()
    };
    let (mut svc, mut eeprom, mut sink) = started(config);
    svc.tick(&mut MockProbe::at(1500.0), &mut sink);

    let outcome = svc
        .handle_command(
            ProbeCommand::Calibrate(BufferPoint::Acidic),
            &mut eeprom,
            &mut sink,
        )
        .expect("sample available");

    assert_eq!(outcome, CommandOutcome::Accepted);
    assert_eq!(svc.calibrator().acid_mv(), 1500.0);
}

#[test]
fn restore_then_restart_recovers_constants() {
    let config = ProbeConfig {
        device_index: 2,
        ..Default::default()
    };
    let (mut svc, mut eeprom, mut sink) = started(config.clone());
    let backup = CalibrationConstants::new(1477.0, 2011.5);

    let outcome = svc
        .handle_command(
            ProbeCommand::RestoreCalibration(backup),
            &mut eeprom,
            &mut sink,
        )
        .expect("restore persists");
    assert_eq!(outcome, CommandOutcome::Restored);
    assert_eq!(eeprom.f32_at(16), 1477.0);

    let mut rebooted = ProbeService::new(config);
    rebooted.start(&mut eeprom, &mut sink);
    assert_eq!(rebooted.calibrator().constants(), backup);
}

#[test]
fn restore_surfaces_storage_error() {
    let (mut svc, mut eeprom, mut sink) = started(ProbeConfig::default());
    eeprom.fail_writes = true;

    let result = svc.handle_command(
        ProbeCommand::RestoreCalibration(CalibrationConstants::new(1400.0, 2000.0)),
        &mut eeprom,
        &mut sink,
    );

    assert_eq!(result, Err(Error::Storage(StorageError::IoError)));
}

#[test]
fn report_command_emits_snapshot() {
    let (mut svc, mut eeprom, mut sink) = started(ProbeConfig::default());
    sink.events.clear();

    let outcome = svc
        .handle_command(ProbeCommand::ReportCalibration, &mut eeprom, &mut sink)
        .expect("report never fails");

    assert_eq!(outcome, CommandOutcome::Reported);
    assert_eq!(
        sink.events,
        vec![CalibrationEvent::Report(CalibrationConstants::default())]
    );
}

#[test]
fn tick_emits_reading() {
    let (mut svc, _, mut sink) = started(ProbeConfig::default());

    let reading = svc.tick(&mut MockProbe::at(2032.44), &mut sink);

    assert!((reading.ph - 4.0).abs() < 1e-3);
    assert_eq!(sink.last(), Some(&CalibrationEvent::Reading(reading)));
}

#[test]
fn restore_with_non_finite_constant_is_refused() {
    let (mut svc, mut eeprom, mut sink) = started(ProbeConfig::default());
    let before = eeprom.bytes.clone();

    let result = svc.handle_command(
        ProbeCommand::RestoreCalibration(CalibrationConstants::new(1500.0, f32::NAN)),
        &mut eeprom,
        &mut sink,
    );

    assert_eq!(
        result,
        Err(Error::Calibration(CalibrationError::NonFinite(
            BufferPoint::Acidic
        )))
    );
    assert_eq!(eeprom.bytes, before);
    assert_eq!(svc.calibrator().constants(), CalibrationConstants::default());
}
