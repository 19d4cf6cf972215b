//! Integration tests for the calibration lifecycle against a mock EEPROM.
//!
//! Covers first boot seeding, buffer calibration in and out of safe mode,
//! manual override, and recovery after a storage write failure.

use crate::mock_hw::{MockEeprom, RecordingSink};

use phprobe::app::events::CalibrationEvent;
use phprobe::app::ports::StorageError;
use phprobe::calibration::{ACID_DEFAULT_MV, NEUTRAL_DEFAULT_MV};
use phprobe::error::{CalibrationError, Error};
use phprobe::{BufferPoint, CalibrationConstants, PhCalibrator};

fn booted(safe_mode: bool) -> (PhCalibrator, MockEeprom, RecordingSink) {
    let mut eeprom = MockEeprom::erased(64);
    let mut sink = RecordingSink::new();
    let mut cal = PhCalibrator::new(0);
    cal.initialize(safe_mode, &mut eeprom, &mut sink);
    (cal, eeprom, sink)
}

// ── First boot ────────────────────────────────────────────────

#[test]
fn first_boot_writes_both_defaults() {
    let (cal, eeprom, _) = booted(true);

    assert_eq!(cal.constants(), CalibrationConstants::default());
    assert_eq!(eeprom.f32_at(0), NEUTRAL_DEFAULT_MV);
    assert_eq!(eeprom.f32_at(4), ACID_DEFAULT_MV);
    assert_eq!(eeprom.writes.len(), 2, "one write per seeded constant");
}

#[test]
fn second_boot_does_not_rewrite() {
    let (_, mut eeprom, mut sink) = booted(true);
    eeprom.writes.clear();

    let mut cal = PhCalibrator::new(0);
    cal.initialize(true, &mut eeprom, &mut sink);

    assert!(eeprom.writes.is_empty(), "stored constants must not be rewritten");
    assert!(matches!(
        sink.last(),
        Some(CalibrationEvent::Loaded {
            point: BufferPoint::Acidic,
            defaulted: false,
            ..
        })
    ));
}

#[test]
fn erased_neutral_only_is_seeded_alone() {
    let mut eeprom = MockEeprom::erased(64);
    eeprom.bytes[4..8].copy_from_slice(&2001.0_f32.to_le_bytes());

    let mut cal = PhCalibrator::new(0);
    cal.initialize(true, &mut eeprom, &mut RecordingSink::new());

    assert_eq!(cal.neutral_mv(), NEUTRAL_DEFAULT_MV);
    assert_eq!(cal.acid_mv(), 2001.0);
    assert_eq!(eeprom.writes, vec![(0, NEUTRAL_DEFAULT_MV.to_le_bytes().to_vec())]);
}

#[test]
fn zero_bytes_decode_as_a_real_constant() {
    let mut eeprom = MockEeprom::erased(64);
    eeprom.bytes[0..4].fill(0x00);

    let mut cal = PhCalibrator::new(0);
    cal.initialize(true, &mut eeprom, &mut RecordingSink::new());

    assert_eq!(cal.neutral_mv(), 0.0);
}

// ── Buffer calibration ────────────────────────────────────────

#[test]
fn two_point_calibration_moves_the_line() {
    let (mut cal, mut eeprom, mut sink) = booted(true);

    cal.set_calibration_input(1530.0, 25.0);
    assert!(cal.calibrate_neutral(&mut eeprom, &mut sink));
    cal.set_calibration_input(2080.0, 25.0);
    assert!(cal.calibrate_acidic(&mut eeprom, &mut sink));

    assert!((cal.compute_ph(1530.0, 25.0) - 7.0).abs() < 1e-3);
    assert!((cal.compute_ph(2080.0, 25.0) - 4.0).abs() < 1e-3);
    // Halfway between the buffers reads halfway between 7 and 4.
    assert!((cal.compute_ph(1805.0, 25.0) - 5.5).abs() < 1e-3);
}

#[test]
fn acid_reading_is_rejected_as_neutral_in_safe_mode() {
    let (mut cal, mut eeprom, mut sink) = booted(true);
    eeprom.writes.clear();

    cal.set_calibration_input(2032.0, 25.0);
    assert!(!cal.calibrate_neutral(&mut eeprom, &mut sink));

    assert_eq!(cal.neutral_mv(), NEUTRAL_DEFAULT_MV);
    assert!(eeprom.writes.is_empty());
    assert!(matches!(
        sink.last(),
        Some(CalibrationEvent::Rejected {
            point: BufferPoint::Neutral,
            ..
        })
    ));
}

#[test]
fn window_bounds_are_rejected_in_safe_mode() {
    let (mut cal, mut eeprom, mut sink) = booted(true);

    for mv in [1322.0, 1678.0] {
        cal.set_calibration_input(mv, 25.0);
        assert!(!cal.calibrate_neutral(&mut eeprom, &mut sink), "{mv} mV");
    }
    for mv in [1854.0, 2210.0] {
        cal.set_calibration_input(mv, 25.0);
        assert!(!cal.calibrate_acidic(&mut eeprom, &mut sink), "{mv} mV");
    }
    assert_eq!(cal.constants(), CalibrationConstants::default());
}

#[test]
fn safe_mode_off_stores_out_of_window_reading() {
    let (mut cal, mut eeprom, mut sink) = booted(false);

    cal.set_calibration_input(1000.0, 25.0);
    assert!(cal.calibrate_neutral(&mut eeprom, &mut sink));

    assert_eq!(cal.neutral_mv(), 1000.0);
    assert_eq!(eeprom.f32_at(0), 1000.0);
}

// ── Override ──────────────────────────────────────────────────

#[test]
fn override_skips_range_checks_and_persists() {
    let (mut cal, mut eeprom, mut sink) = booted(true);

    cal.override_calibration(900.0, 2500.0, &mut eeprom, &mut sink)
        .expect("override persists");

    assert_eq!(cal.constants(), CalibrationConstants::new(900.0, 2500.0));
    assert_eq!(eeprom.f32_at(0), 900.0);
    assert_eq!(eeprom.f32_at(4), 2500.0);
    assert_eq!(
        sink.last(),
        Some(&CalibrationEvent::Overridden(CalibrationConstants::new(
            900.0, 2500.0
        )))
    );
}

#[test]
fn override_then_restart_keeps_every_accepted_value() {
    let (mut cal, mut eeprom, mut sink) = booted(false);

    let refused = cal.override_calibration(f32::INFINITY, 2000.0, &mut eeprom, &mut sink);
    assert_eq!(
        refused,
        Err(Error::Calibration(CalibrationError::NonFinite(
            BufferPoint::Neutral
        )))
    );
    cal.set_calibration_input(f32::NAN, 25.0);
    assert!(!cal.calibrate_acidic(&mut eeprom, &mut sink));

    cal.override_calibration(1501.5, 2000.0, &mut eeprom, &mut sink)
        .expect("finite override persists");

    let mut reloaded = PhCalibrator::new(0);
    reloaded.initialize(false, &mut eeprom, &mut sink);
    assert_eq!(reloaded.constants(), cal.constants());
    assert_eq!(reloaded.constants(), CalibrationConstants::new(1501.5, 2000.0));
}

// ── Storage failures ──────────────────────────────────────────

#[test]
fn failed_write_keeps_value_in_memory() {
    let (mut cal, mut eeprom, mut sink) = booted(true);
    eeprom.fail_writes = true;

    cal.set_calibration_input(1490.0, 25.0);
    assert!(cal.calibrate_neutral(&mut eeprom, &mut sink));

    assert_eq!(cal.neutral_mv(), 1490.0);
    assert_eq!(eeprom.f32_at(0), NEUTRAL_DEFAULT_MV);
    assert!(sink.events.contains(&CalibrationEvent::PersistFailed {
        point: BufferPoint::Neutral,
        error: StorageError::IoError,
    }));
}

#[test]
fn failed_override_reports_error() {
    let (mut cal, mut eeprom, mut sink) = booted(true);
    eeprom.fail_writes = true;

    let result = cal.override_calibration(1450.0, 2000.0, &mut eeprom, &mut sink);

    assert_eq!(result, Err(Error::Storage(StorageError::IoError)));
    assert_eq!(cal.constants(), CalibrationConstants::new(1450.0, 2000.0));
}

#[test]
fn failed_seed_write_still_boots_with_defaults() {
    let mut eeprom = MockEeprom::erased(64);
    eeprom.fail_writes = true;
    let mut sink = RecordingSink::new();

    let mut cal = PhCalibrator::new(0);
    cal.initialize(true, &mut eeprom, &mut sink);

    assert_eq!(cal.constants(), CalibrationConstants::default());
    let failures = sink
        .events
        .iter()
        .filter(|e| matches!(e, CalibrationEvent::PersistFailed { .. }))
        .count();
    assert_eq!(failures, 2);
}
