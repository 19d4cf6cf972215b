//! Outbound diagnostic events.
//!
//! The calibration core emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them — log to serial, record in a test, etc.

use crate::calibration::{BufferPoint, CalibrationConstants, VoltageWindow};

use super::ports::StorageError;

/// Structured events emitted by the calibration core.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationEvent {
    /// A constant was loaded during `initialize`.  `defaulted` is true when
    /// the slot was blank and the default was written back.
    Loaded {
        point: BufferPoint,
        millivolts: f32,
        defaulted: bool,
    },

    /// A buffer-solution voltage was accepted and persisted.
    Accepted { point: BufferPoint, millivolts: f32 },

    /// A buffer-solution voltage fell outside its window in safe mode.
    Rejected {
        point: BufferPoint,
        millivolts: f32,
        window: VoltageWindow,
    },

    /// Snapshot requested via `report_calibration`.
    Report(CalibrationConstants),

    /// Both constants were overwritten via `override_calibration`.
    Overridden(CalibrationConstants),

    /// Writing a constant back to storage failed.
    PersistFailed {
        point: BufferPoint,
        error: StorageError,
    },

    /// Periodic pH reading produced by the probe service.
    Reading(PhReading),
}

/// A point-in-time measurement suitable for logging or transmission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhReading {
    pub raw: u16,
    pub millivolts: f32,
    pub temperature_c: f32,
    pub ph: f32,
}
