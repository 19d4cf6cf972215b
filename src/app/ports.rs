//! Port traits — the hexagonal boundary between the calibration core and
//! the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ PhCalibrator / ProbeService (domain)
//! ```
//!
//! Driven adapters (probe ADC, emulated EEPROM, diagnostic sinks) implement
//! these traits.  The domain consumes them via generics injected at call
//! sites, so several calibrators can share a single storage medium.

use crate::config::ProbeConfig;
use crate::sensors::ProbeSample;

use super::events::CalibrationEvent;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the service calls this once per tick.
pub trait SensorPort {
    /// Take one (averaged) probe sample.
    fn sample(&mut self) -> ProbeSample;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The calibration core emits [`CalibrationEvent`]s through this port.
/// Adapters decide where they go (serial log, test recorder, ...).
pub trait EventSink {
    fn emit(&mut self, event: &CalibrationEvent);
}

// ───────────────────────────────────────────────────────────────
// Byte storage port (driven adapter: domain ↔ EEPROM / NVS)
// ───────────────────────────────────────────────────────────────

/// Flat, byte-addressable persistent storage.
///
/// Addresses start at zero and run up to [`capacity`](Self::capacity).
/// Never-written bytes read back as `0xFF`, matching erased EEPROM/flash.
/// Reads and writes are all-or-nothing: an access that would run past the
/// end fails with [`StorageError::OutOfBounds`] and touches nothing.
pub trait ByteStorage {
    /// Total addressable size in bytes.
    fn capacity(&self) -> usize;

    /// Fill `buf` with the bytes stored at `address..address + buf.len()`.
    fn read(&self, address: usize, buf: &mut [u8]) -> Result<(), StorageError>;

    /// Store `data` at `address..address + data.len()`.
    fn write(&mut self, address: usize, data: &[u8]) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists probe configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`ProbeConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<ProbeConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&mut self, config: &ProbeConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`ByteStorage`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// The access `address..address + len` runs past the end of storage.
    OutOfBounds { address: usize, len: usize },
    /// Generic I/O error from the backend (flash, NVS commit).
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutOfBounds { address, len } => {
                write!(f, "access of {} bytes at 0x{:04x} out of bounds", len, address)
            }
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
