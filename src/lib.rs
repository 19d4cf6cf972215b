//! pH probe firmware library.
//!
//! Two-point (pH 7.0 / pH 4.0) calibration for an analog pH probe, with the
//! calibration constants persisted in a byte-addressable EEPROM slot per
//! probe.  Exposes the pure-logic modules for integration testing; all
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod calibration;
pub mod config;
pub mod error;
pub mod pins;

pub mod adapters;
pub mod drivers;
pub mod sensors;

pub use calibration::{BufferPoint, CalibrationConstants, PhCalibrator, VoltageWindow};
