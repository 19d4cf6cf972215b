//! Analog pH probe driver.
//!
//! Reads the probe board's output through an ESP32-S3 ADC channel,
//! converts counts to millivolts and keeps a moving average over the last
//! `averaging_samples` readings.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads the ADC1 channel behind the probe pin via the oneshot
//! API (initialised by hw_init).
//! On host/test: reads from a static `AtomicU16` for injection.

use heapless::Deque;

use crate::config::ProbeConfig;
use crate::sensors::ProbeSample;

use crate::drivers::hw_init;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

/// 1861 counts ≈ 1500 mV at 3300 mV / 4095: a probe sitting in pH 7.0.
#[cfg(not(target_os = "espidf"))]
static SIM_PH_ADC: AtomicU16 = AtomicU16::new(1861);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_ph_adc(raw: u16) {
    SIM_PH_ADC.store(raw, Ordering::Relaxed);
}

/// Upper bound for `averaging_samples`.
pub const MAX_AVERAGING: usize = 32;

pub struct PhProbe {
    vref_mv: f32,
    adc_max: f32,
    ambient_c: f32,
    window: usize,
    history: Deque<f32, MAX_AVERAGING>,
    channel: u32,
}

impl PhProbe {
    pub fn new(adc_gpio: i32, config: &ProbeConfig) -> Self {
        Self {
            vref_mv: config.adc_vref_mv,
            adc_max: f32::from(config.adc_max_count.max(1)),
            ambient_c: config.ambient_temperature_c,
            window: (config.averaging_samples as usize).clamp(1, MAX_AVERAGING),
            history: Deque::new(),
            channel: hw_init::adc1_channel(adc_gpio),
        }
    }

    /// Read the ADC once and return the updated average.
    pub fn read(&mut self) -> ProbeSample {
        let raw = self.read_adc();
        self.ingest(raw)
    }

    /// Fold one raw count into the moving average.
    pub fn ingest(&mut self, raw: u16) -> ProbeSample {
        while self.history.len() >= self.window {
            self.history.pop_front();
        }
        // Cannot fail: len < window <= capacity after the loop above.
        let _ = self.history.push_back(self.counts_to_mv(raw));

        let sum: f32 = self.history.iter().sum();
        ProbeSample {
            raw,
            millivolts: sum / self.history.len() as f32,
            temperature_c: self.ambient_c,
        }
    }

    /// Linear ADC transfer: `raw / max * vref`.
    pub fn counts_to_mv(&self, raw: u16) -> f32 {
        f32::from(raw) / self.adc_max * self.vref_mv
    }

    /// ADC1 channel this probe is read from.
    pub fn channel(&self) -> u32 {
        self.channel
    }

    /// Drop the averaging history (e.g. after moving the probe to a new buffer).
    pub fn reset(&mut self) {
        self.history.clear();
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> u16 {
        hw_init::adc1_read(self.channel)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> u16 {
        SIM_PH_ADC.load(Ordering::Relaxed)
    }
}
