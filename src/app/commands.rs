//! Inbound commands to the probe service.
//!
//! These represent actions requested by the outside world (serial console,
//! RPC, provisioning) that the [`ProbeService`](super::service::ProbeService)
//! interprets and acts upon.

use crate::calibration::{BufferPoint, CalibrationConstants};

/// Commands that external adapters can send into the probe service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeCommand {
    /// Calibrate against a buffer solution using the latest sample.
    Calibrate(BufferPoint),

    /// Overwrite both constants from a known-good backup, no range checks.
    RestoreCalibration(CalibrationConstants),

    /// Emit the current constants to the event sink.
    ReportCalibration,
}

/// What a successfully dispatched [`ProbeCommand`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The sample was inside the window (or safe mode is off) and was stored.
    Accepted,
    /// The sample was outside the window; nothing changed.
    Rejected,
    /// Constants were restored and persisted.
    Restored,
    /// A calibration report was emitted.
    Reported,
}
