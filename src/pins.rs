//! GPIO / peripheral pin assignments for the probe board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Sensors — Analog (ADC1)
// ---------------------------------------------------------------------------

/// Gravity analog pH meter output.
/// ADC1 channel 3 (GPIO 4 on ESP32-S3).
pub const PH_ADC_GPIO: i32 = 4;
