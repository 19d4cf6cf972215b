//! Sensor subsystem — the pH probe driver and the sample it produces.
//!
//! The probe board outputs an analog voltage centred near 1500 mV at
//! pH 7.0.  [`ph_probe::PhProbe`] turns ADC counts into an averaged
//! millivolt [`ProbeSample`] each tick; the calibration engine does the rest.

pub mod ph_probe;

/// One averaged reading from the probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeSample {
    /// Latest raw ADC count.
    pub raw: u16,
    /// Moving average of the probe voltage.
    pub millivolts: f32,
    /// Temperature reported alongside the voltage.
    pub temperature_c: f32,
}
