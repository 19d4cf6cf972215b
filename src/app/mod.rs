//! Application core — pure domain logic, zero I/O.
//!
//! This module wraps the calibration engine in the probe service and
//! defines the port traits it talks through.  All interaction with
//! hardware happens through **port traits** defined in [`ports`], keeping
//! this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
