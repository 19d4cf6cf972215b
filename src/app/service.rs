//! Probe service — the hexagonal core around the calibration engine.
//!
//! [`ProbeService`] owns the [`PhCalibrator`] for one probe and the last
//! sample taken.  All I/O flows through port traits injected at call
//! sites, making the entire service testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                 │      ProbeService       │
//! ByteStorage ◀──▶│     PhCalibrator        │
//!                 └────────────────────────┘
//! ```

use log::{info, warn};

use crate::calibration::PhCalibrator;
use crate::config::ProbeConfig;
use crate::error::{Result, SensorError};
use crate::sensors::ProbeSample;

use super::commands::{CommandOutcome, ProbeCommand};
use super::events::{CalibrationEvent, PhReading};
use super::ports::{ByteStorage, EventSink, SensorPort};

/// Drives one probe: periodic sampling plus calibration commands.
pub struct ProbeService {
    calibrator: PhCalibrator,
    config: ProbeConfig,
    last_sample: Option<ProbeSample>,
    tick_count: u64,
}

impl ProbeService {
    /// Construct the service from configuration.
    ///
    /// Does **not** touch storage — call [`start`](Self::start) next.
    pub fn new(config: ProbeConfig) -> Self {
        Self {
            calibrator: PhCalibrator::new(config.device_index),
            config,
            last_sample: None,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Load (or seed) the calibration constants and report them.
    pub fn start(&mut self, storage: &mut impl ByteStorage, sink: &mut impl EventSink) {
        self.calibrator
            .initialize(self.config.safe_mode, storage, sink);
        self.calibrator.report_calibration(sink);
        info!(
            "ProbeService started (device {}, safe_mode={})",
            self.config.device_index, self.config.safe_mode
        );
    }

    // ── Per-tick sampling ─────────────────────────────────────

    /// Take one sample, feed it to the calibrator and convert it to pH.
    pub fn tick(&mut self, sensor: &mut impl SensorPort, sink: &mut impl EventSink) -> PhReading {
        self.tick_count += 1;

        let sample = sensor.sample();
        self.calibrator
            .set_calibration_input(sample.millivolts, sample.temperature_c);
        let ph = self
            .calibrator
            .compute_ph(sample.millivolts, sample.temperature_c);
        if !ph.is_finite() {
            warn!("ProbeService: non-finite pH, neutral and acid constants coincide");
        }
        self.last_sample = Some(sample);

        let reading = PhReading {
            raw: sample.raw,
            millivolts: sample.millivolts,
            temperature_c: sample.temperature_c,
            ph,
        };
        sink.emit(&CalibrationEvent::Reading(reading));
        reading
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (serial console, RPC, etc.).
    ///
    /// Calibration uses the sample from the most recent [`tick`](Self::tick).
    pub fn handle_command(
        &mut self,
        cmd: ProbeCommand,
        storage: &mut impl ByteStorage,
        sink: &mut impl EventSink,
    ) -> Result<CommandOutcome> {
        match cmd {
            ProbeCommand::Calibrate(point) => {
                if self.last_sample.is_none() {
                    return Err(SensorError::NoSample.into());
                }
                if self.calibrator.calibrate(point, storage, sink) {
                    Ok(CommandOutcome::Accepted)
                } else {
                    Ok(CommandOutcome::Rejected)
                }
            }
            ProbeCommand::RestoreCalibration(constants) => {
                self.calibrator.override_calibration(
                    constants.neutral_mv,
                    constants.acid_mv,
                    storage,
                    sink,
                )?;
                Ok(CommandOutcome::Restored)
            }
            ProbeCommand::ReportCalibration => {
                self.calibrator.report_calibration(sink);
                Ok(CommandOutcome::Reported)
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn calibrator(&self) -> &PhCalibrator {
        &self.calibrator
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Sample taken by the most recent tick, if any.
    pub fn last_sample(&self) -> Option<ProbeSample> {
        self.last_sample
    }

    /// Total ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
