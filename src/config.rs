//! Probe configuration parameters
//!
//! All tunable parameters for one pH probe channel.
//! Values can be overridden via NVS (non-volatile storage).

use serde::{Deserialize, Serialize};

/// Core probe configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    // --- Calibration ---
    /// Probe index; selects the 8-byte calibration slot (`index * 8`)
    pub device_index: u8,
    /// Reject buffer readings outside the expected millivolt windows
    pub safe_mode: bool,

    // --- ADC ---
    /// ADC full-scale reference (millivolts)
    pub adc_vref_mv: f32,
    /// Raw count at full scale (4095 for 12-bit)
    pub adc_max_count: u16,
    /// Number of readings in the moving average (1-32)
    pub averaging_samples: u8,

    // --- Environment ---
    /// Temperature reported with each sample (Celsius); the probe board
    /// has no temperature channel of its own
    pub ambient_temperature_c: f32,

    // --- Timing ---
    /// Probe sample interval (milliseconds)
    pub sample_interval_ms: u32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            // Calibration
            device_index: 0,
            safe_mode: true,

            // ADC (ESP32-S3, 12 dB attenuation, 12-bit)
            adc_vref_mv: 3300.0,
            adc_max_count: 4095,
            averaging_samples: 10,

            // Environment
            ambient_temperature_c: 25.0,

            // Timing
            sample_interval_ms: 1000, // 1 Hz
        }
    }
}
