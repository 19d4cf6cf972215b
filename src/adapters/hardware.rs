//! Hardware adapter — bridges the probe driver to the [`SensorPort`] trait.
//!
//! This is the only module in the system that touches the ADC.  On
//! non-espidf targets the underlying driver uses its simulation stub.

use crate::app::ports::SensorPort;
use crate::sensors::ProbeSample;
use crate::sensors::ph_probe::PhProbe;

/// Concrete adapter that puts the pH probe behind [`SensorPort`].
pub struct HardwareAdapter {
    probe: PhProbe,
}

impl HardwareAdapter {
    pub fn new(probe: PhProbe) -> Self {
        Self { probe }
    }
}

impl SensorPort for HardwareAdapter {
    fn sample(&mut self) -> ProbeSample {
        self.probe.read()
    }
}
