//! Two-point pH calibration engine.
//!
//! Maps probe millivolts to pH along the line through the neutral (pH 7.0)
//! and acidic (pH 4.0) buffer readings.  Both reference voltages are kept
//! in an 8-byte slot per probe as little-endian `f32`:
//!
//! ```text
//!   offset + 0..4   neutral mV (pH 7.0)
//!   offset + 4..8   acid mV    (pH 4.0)
//! ```
//!
//! Erased storage (all bytes 0xFF) is seeded with the typical readings of
//! the probe board at 25 °C and written back immediately.  Both constants
//! stay finite: non-finite values are refused on the way in and treated as
//! erased on the way out.
//!
//! Each axis evolves on its own:
//!
//! ```text
//!   Uninitialized ──initialize──▶ Default ──calibrate (accepted)──▶ Calibrated
//!                                    ▲                                  │
//!                                    └──── rejected attempts: no-op ────┘
//! ```
//!
//! The temperature argument of [`PhCalibrator::compute_ph`] is recorded but
//! not applied: the conversion has no temperature compensation.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::app::events::CalibrationEvent;
use crate::app::ports::{ByteStorage, EventSink, StorageError};
use crate::error::{CalibrationError, Result};

/// Typical neutral-buffer (pH 7.0) reading at 25 °C.
pub const NEUTRAL_DEFAULT_MV: f32 = 1500.0;
/// Typical acid-buffer (pH 4.0) reading at 25 °C.
pub const ACID_DEFAULT_MV: f32 = 2032.44;
/// Bytes reserved per probe: two `f32` constants.
pub const SLOT_SIZE: usize = 8;

/// Erased EEPROM/flash byte.
const SENTINEL: u8 = 0xFF;
/// Readings are re-centred on the probe midpoint before interpolation.
const MIDPOINT_MV: f32 = 1500.0;
/// Probe sensitivity: ~3 mV per 0.01 pH at 25 °C.
const MV_SCALE: f32 = 3.0;

const INITIAL_TEMPERATURE_C: f32 = 25.0;
const INITIAL_PH: f32 = 7.0;

// ───────────────────────────────────────────────────────────────
// Buffer points and acceptance windows
// ───────────────────────────────────────────────────────────────

/// Reference buffer solutions the probe is calibrated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BufferPoint {
    /// pH 7.0 buffer.
    Neutral,
    /// pH 4.0 buffer.
    Acidic,
}

impl BufferPoint {
    /// Nominal pH of the buffer solution.
    pub const fn ph(self) -> f32 {
        match self {
            Self::Neutral => 7.0,
            Self::Acidic => 4.0,
        }
    }

    /// Millivolt window a reading must fall inside in safe mode.
    pub const fn window(self) -> VoltageWindow {
        match self {
            Self::Neutral => VoltageWindow::NEUTRAL,
            Self::Acidic => VoltageWindow::ACIDIC,
        }
    }

    /// Value used when the storage slot is blank.
    pub const fn default_mv(self) -> f32 {
        match self {
            Self::Neutral => NEUTRAL_DEFAULT_MV,
            Self::Acidic => ACID_DEFAULT_MV,
        }
    }

    const fn slot_offset(self) -> usize {
        match self {
            Self::Neutral => 0,
            Self::Acidic => 4,
        }
    }
}

/// Open millivolt interval `(low_mv, high_mv)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoltageWindow {
    pub low_mv: f32,
    pub high_mv: f32,
}

impl VoltageWindow {
    /// ±178 mV around the ~1500 mV pH 7.0 reading.
    pub const NEUTRAL: Self = Self {
        low_mv: 1322.0,
        high_mv: 1678.0,
    };

    /// ±178 mV around the ~2032 mV pH 4.0 reading.
    pub const ACIDIC: Self = Self {
        low_mv: 1854.0,
        high_mv: 2210.0,
    };

    /// Strictly inside the window; both bounds are excluded.
    pub fn contains(&self, millivolts: f32) -> bool {
        millivolts > self.low_mv && millivolts < self.high_mv
    }
}

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

/// The two persisted reference voltages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConstants {
    pub neutral_mv: f32,
    pub acid_mv: f32,
}

impl Default for CalibrationConstants {
    fn default() -> Self {
        Self::new(NEUTRAL_DEFAULT_MV, ACID_DEFAULT_MV)
    }
}

impl CalibrationConstants {
    pub const fn new(neutral_mv: f32, acid_mv: f32) -> Self {
        Self {
            neutral_mv,
            acid_mv,
        }
    }

    /// Reference voltage for `point`.
    pub const fn get(&self, point: BufferPoint) -> f32 {
        match point {
            BufferPoint::Neutral => self.neutral_mv,
            BufferPoint::Acidic => self.acid_mv,
        }
    }

    fn set(&mut self, point: BufferPoint, millivolts: f32) {
        match point {
            BufferPoint::Neutral => self.neutral_mv = millivolts,
            BufferPoint::Acidic => self.acid_mv = millivolts,
        }
    }

    /// `(slope, intercept)` of the pH line in normalised units.
    ///
    /// Coinciding constants give an infinite slope; callers see the
    /// non-finite result unchanged.
    pub fn line(&self) -> (f32, f32) {
        let nv = normalise(self.neutral_mv);
        let av = normalise(self.acid_mv);
        let slope = (BufferPoint::Neutral.ph() - BufferPoint::Acidic.ph()) / (nv - av);
        let intercept = BufferPoint::Neutral.ph() - slope * nv;
        (slope, intercept)
    }
}

#[inline]
fn normalise(millivolts: f32) -> f32 {
    (millivolts - MIDPOINT_MV) / MV_SCALE
}

// ───────────────────────────────────────────────────────────────
// PhCalibrator
// ───────────────────────────────────────────────────────────────

/// Calibration state for one probe.
///
/// Storage and the diagnostic sink are passed in per call, so several
/// calibrators (one per `device_index`) can share a single EEPROM.
#[derive(Debug, Clone)]
pub struct PhCalibrator {
    constants: CalibrationConstants,
    voltage_mv: f32,
    temperature_c: f32,
    last_ph: f32,
    safe_mode: bool,
    storage_offset: usize,
}

impl PhCalibrator {
    /// Calibrator for probe `device_index`, stored at `device_index * 8`.
    ///
    /// Distinct indices never share bytes.
    pub fn new(device_index: u8) -> Self {
        Self::with_offset(device_index as usize * SLOT_SIZE)
    }

    /// Calibrator stored at an explicit byte offset.
    ///
    /// The caller must keep the 8-byte slots of different probes apart.
    pub fn with_offset(storage_offset: usize) -> Self {
        Self {
            constants: CalibrationConstants::default(),
            voltage_mv: NEUTRAL_DEFAULT_MV,
            temperature_c: INITIAL_TEMPERATURE_C,
            last_ph: INITIAL_PH,
            safe_mode: true,
            storage_offset,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Load both constants from storage, seeding blank slots with defaults.
    ///
    /// Never fails: an unreadable slot is handled like an erased one, and a
    /// failed write-back is reported through `sink`.
    pub fn initialize(
        &mut self,
        safe_mode: bool,
        storage: &mut impl ByteStorage,
        sink: &mut impl EventSink,
    ) {
        self.load_point(BufferPoint::Neutral, storage, sink);
        self.load_point(BufferPoint::Acidic, storage, sink);
        self.safe_mode = safe_mode;
    }

    fn load_point(
        &mut self,
        point: BufferPoint,
        storage: &mut impl ByteStorage,
        sink: &mut impl EventSink,
    ) {
        let address = self.address_of(point);
        let mut bytes = [SENTINEL; 4];
        if let Err(e) = storage.read(address, &mut bytes) {
            warn!(
                "PhCalibrator: reading {:?} constant at 0x{:04x} failed ({}), using default",
                point, address, e
            );
            bytes = [SENTINEL; 4];
        }

        let stored = f32::from_le_bytes(bytes);
        let blank = bytes.iter().all(|b| *b == SENTINEL) || !stored.is_finite();
        let millivolts = if blank { point.default_mv() } else { stored };
        self.constants.set(point, millivolts);

        sink.emit(&CalibrationEvent::Loaded {
            point,
            millivolts,
            defaulted: blank,
        });
        if blank {
            self.persist_or_report(point, storage, sink);
        }
    }

    // ── Sampling and conversion ───────────────────────────────

    /// Record the latest probe reading for range checks and calibration.
    pub fn set_calibration_input(&mut self, voltage_mv: f32, temperature_c: f32) {
        self.voltage_mv = voltage_mv;
        self.temperature_c = temperature_c;
    }

    /// Convert a probe voltage to pH with the current constants.
    ///
    /// `_temperature_c` is not applied.  If both constants are equal the
    /// result is infinite or NaN; see [`is_degenerate`](Self::is_degenerate).
    pub fn compute_ph(&mut self, voltage_mv: f32, _temperature_c: f32) -> f32 {
        let (slope, intercept) = self.constants.line();
        self.last_ph = slope * normalise(voltage_mv) + intercept;
        self.last_ph
    }

    pub fn is_within_neutral_range(&self) -> bool {
        BufferPoint::Neutral.window().contains(self.voltage_mv)
    }

    pub fn is_within_acidic_range(&self) -> bool {
        BufferPoint::Acidic.window().contains(self.voltage_mv)
    }

    // ── Calibration ───────────────────────────────────────────

    /// Take the last sample as the pH 7.0 reference.
    ///
    /// Returns `false` (and changes nothing) if the sample is not finite, or
    /// if safe mode is on and the sample is outside (1322, 1678) mV.
    pub fn calibrate_neutral(
        &mut self,
        storage: &mut impl ByteStorage,
        sink: &mut impl EventSink,
    ) -> bool {
        self.calibrate(BufferPoint::Neutral, storage, sink)
    }

    /// Take the last sample as the pH 4.0 reference.
    ///
    /// Returns `false` (and changes nothing) if the sample is not finite, or
    /// if safe mode is on and the sample is outside (1854, 2210) mV.
    pub fn calibrate_acidic(
        &mut self,
        storage: &mut impl ByteStorage,
        sink: &mut impl EventSink,
    ) -> bool {
        self.calibrate(BufferPoint::Acidic, storage, sink)
    }

    /// Dispatch on `point`; used by the probe service.
    pub fn calibrate(
        &mut self,
        point: BufferPoint,
        storage: &mut impl ByteStorage,
        sink: &mut impl EventSink,
    ) -> bool {
        let millivolts = self.voltage_mv;
        let window = point.window();

        let acceptable =
            millivolts.is_finite() && (!self.safe_mode || window.contains(millivolts));
        if !acceptable {
            sink.emit(&CalibrationEvent::Rejected {
                point,
                millivolts,
                window,
            });
            return false;
        }

        self.constants.set(point, millivolts);
        self.persist_or_report(point, storage, sink);
        sink.emit(&CalibrationEvent::Accepted { point, millivolts });
        true
    }

    /// Overwrite both constants without range checks and persist them.
    ///
    /// A non-finite value is refused before anything changes.  Otherwise
    /// both writes are attempted and the first failure is returned; the
    /// in-memory constants are updated either way.
    pub fn override_calibration(
        &mut self,
        neutral_mv: f32,
        acid_mv: f32,
        storage: &mut impl ByteStorage,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        if !neutral_mv.is_finite() {
            return Err(CalibrationError::NonFinite(BufferPoint::Neutral).into());
        }
        if !acid_mv.is_finite() {
            return Err(CalibrationError::NonFinite(BufferPoint::Acidic).into());
        }

        self.constants = CalibrationConstants::new(neutral_mv, acid_mv);
        let neutral = self.persist_neutral(storage);
        let acid = self.persist_acidic(storage);
        sink.emit(&CalibrationEvent::Overridden(self.constants));
        neutral.and(acid).map_err(Into::into)
    }

    /// Emit a snapshot of both constants.
    pub fn report_calibration(&self, sink: &mut impl EventSink) {
        sink.emit(&CalibrationEvent::Report(self.constants));
    }

    // ── Persistence ───────────────────────────────────────────

    pub fn persist_neutral(
        &self,
        storage: &mut impl ByteStorage,
    ) -> core::result::Result<(), StorageError> {
        self.persist(BufferPoint::Neutral, storage)
    }

    pub fn persist_acidic(
        &self,
        storage: &mut impl ByteStorage,
    ) -> core::result::Result<(), StorageError> {
        self.persist(BufferPoint::Acidic, storage)
    }

    fn persist(
        &self,
        point: BufferPoint,
        storage: &mut impl ByteStorage,
    ) -> core::result::Result<(), StorageError> {
        let bytes = self.constants.get(point).to_le_bytes();
        storage.write(self.address_of(point), &bytes)
    }

    fn persist_or_report(
        &self,
        point: BufferPoint,
        storage: &mut impl ByteStorage,
        sink: &mut impl EventSink,
    ) {
        if let Err(error) = self.persist(point, storage) {
            sink.emit(&CalibrationEvent::PersistFailed { point, error });
        }
    }

    fn address_of(&self, point: BufferPoint) -> usize {
        self.storage_offset + point.slot_offset()
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn constants(&self) -> CalibrationConstants {
        self.constants
    }

    pub fn neutral_mv(&self) -> f32 {
        self.constants.neutral_mv
    }

    pub fn acid_mv(&self) -> f32 {
        self.constants.acid_mv
    }

    /// Last sample passed to [`set_calibration_input`](Self::set_calibration_input).
    pub fn voltage_mv(&self) -> f32 {
        self.voltage_mv
    }

    /// Last temperature recorded; informational only.
    pub fn temperature_c(&self) -> f32 {
        self.temperature_c
    }

    /// Last value returned by [`compute_ph`](Self::compute_ph).
    pub fn last_ph(&self) -> f32 {
        self.last_ph
    }

    pub fn safe_mode(&self) -> bool {
        self.safe_mode
    }

    pub fn storage_offset(&self) -> usize {
        self.storage_offset
    }

    /// True when both constants normalise to the same value, so
    /// [`compute_ph`](Self::compute_ph) cannot return a finite pH.
    pub fn is_degenerate(&self) -> bool {
        normalise(self.constants.neutral_mv) == normalise(self.constants.acid_mv)
    }
}
