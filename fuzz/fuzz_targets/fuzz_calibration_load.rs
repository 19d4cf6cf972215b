//! Fuzz target: calibration load from arbitrary EEPROM contents
//!
//! Fills the first calibration slots with fuzz bytes, boots a calibrator on
//! each and verifies:
//! - No panics on any stored bit pattern
//! - Loaded constants are always finite (non-finite patterns fall back to
//!   defaults)
//! - A second boot loads the same constants and writes nothing
//!
//! cargo fuzz run fuzz_calibration_load

#![no_main]

use libfuzzer_sys::fuzz_target;
use phprobe::PhCalibrator;
use phprobe::app::events::CalibrationEvent;
use phprobe::app::ports::{ByteStorage, EventSink, StorageError};

// ── In-memory ByteStorage for fuzz testing ────────────────────

struct MemEeprom {
    bytes: [u8; 64],
    writes: usize,
}

impl ByteStorage for MemEeprom {
    fn capacity(&self) -> usize {
        self.bytes.len()
    }

    fn read(&self, address: usize, buf: &mut [u8]) -> Result<(), StorageError> {
        let src = self
            .bytes
            .get(address..address + buf.len())
            .ok_or(StorageError::OutOfBounds { address, len: buf.len() })?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write(&mut self, address: usize, data: &[u8]) -> Result<(), StorageError> {
        let dst = self
            .bytes
            .get_mut(address..address + data.len())
            .ok_or(StorageError::OutOfBounds { address, len: data.len() })?;
        dst.copy_from_slice(data);
        self.writes += 1;
        Ok(())
    }
}

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &CalibrationEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let mut eeprom = MemEeprom { bytes: [0xFF; 64], writes: 0 };
    let n = data.len().min(eeprom.bytes.len());
    eeprom.bytes[..n].copy_from_slice(&data[..n]);

    for device in 0..8u8 {
        let mut cal = PhCalibrator::new(device);
        cal.initialize(true, &mut eeprom, &mut Discard);
        assert!(cal.neutral_mv().is_finite(), "device {device}: neutral not finite");
        assert!(cal.acid_mv().is_finite(), "device {device}: acid not finite");

        let writes = eeprom.writes;
        let mut again = PhCalibrator::new(device);
        again.initialize(true, &mut eeprom, &mut Discard);
        assert_eq!(again.constants(), cal.constants());
        assert_eq!(eeprom.writes, writes, "device {device}: second boot wrote");
    }
});
