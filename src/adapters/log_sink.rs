//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing calibration events to the `log`
//! facade (which goes to UART / USB-CDC in production via the ESP-IDF
//! logger).  These lines are the operator-facing diagnostics of the probe.

use log::{info, warn};

use crate::app::events::CalibrationEvent;
use crate::app::ports::EventSink;
use crate::calibration::BufferPoint;

/// Adapter that logs every [`CalibrationEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn label(point: BufferPoint) -> &'static str {
    match point {
        BufferPoint::Neutral => "neutralVoltage (pH 7)",
        BufferPoint::Acidic => "acidVoltage (pH 4)",
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &CalibrationEvent) {
        match event {
            CalibrationEvent::Loaded {
                point,
                millivolts,
                defaulted,
            } => {
                info!(
                    "LOAD  | {}: {:.2} mV{}",
                    label(*point),
                    millivolts,
                    if *defaulted { " (blank slot, default written)" } else { "" }
                );
            }
            CalibrationEvent::Accepted { point, millivolts } => {
                info!(
                    "CAL   | >>> Buffer Solution: {:.1} | Voltage: {:.3} mV",
                    point.ph(),
                    millivolts
                );
            }
            CalibrationEvent::Rejected {
                point,
                millivolts,
                window,
            } => {
                warn!(
                    "CAL   | {:.3} out of range ({}, {}). Not pH {:.1}",
                    millivolts,
                    window.low_mv,
                    window.high_mv,
                    point.ph()
                );
            }
            CalibrationEvent::Report(c) => {
                info!(
                    "CAL   | neutralVoltage (pH 7): {:.5} | acidVoltage (pH 4): {:.5}",
                    c.neutral_mv, c.acid_mv
                );
            }
            CalibrationEvent::Overridden(c) => {
                info!(
                    "CAL   | overridden: neutral={:.5} mV acid={:.5} mV",
                    c.neutral_mv, c.acid_mv
                );
            }
            CalibrationEvent::PersistFailed { point, error } => {
                warn!("STORE | {} not persisted: {}", label(*point), error);
            }
            CalibrationEvent::Reading(r) => {
                info!(
                    "PH    | raw={} | {:.1} mV | T={:.1}\u{00b0}C | pH={:.2}",
                    r.raw, r.millivolts, r.temperature_c, r.ph
                );
            }
        }
    }
}
