//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements both [`ConfigPort`] and [`ByteStorage`] for the probe.
//!
//! # Emulated EEPROM
//!
//! The calibration constants expect a small byte-addressable EEPROM.  The
//! ESP32 has none, so a 64-byte image is mirrored in RAM and committed to
//! NVS as a single blob (`phprobe`/`eeprom`) on every write that changes
//! it.  A missing blob means erased storage: every byte reads `0xFF`.
//! 64 bytes hold eight 8-byte probe slots.
//!
//! # Config
//!
//! [`ProbeConfig`] is postcard-encoded under `phprobe`/`probecfg`.  All
//! fields are range-checked before persistence.
//!
//! The simulation backend keeps blobs in a `HashMap` (dev/test only).

use core::ffi::CStr;
use core::ops::Range;

use log::{info, warn};

use crate::app::ports::{ByteStorage, ConfigError, ConfigPort, StorageError};
use crate::calibration::SLOT_SIZE;
use crate::config::ProbeConfig;
use crate::sensors::ph_probe::MAX_AVERAGING;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// Size of the emulated EEPROM image.
pub const EEPROM_SIZE: usize = 64;
const ERASED: u8 = 0xFF;

#[cfg(target_os = "espidf")]
const NAMESPACE: &CStr = c"phprobe";
const CONFIG_KEY: &CStr = c"probecfg";
const EEPROM_KEY: &CStr = c"eeprom";

const MAX_CONFIG_BLOB: usize = 64;

#[cfg(not(target_os = "espidf"))]
type BlobError = i32;
#[cfg(target_os = "espidf")]
type BlobError = esp_err_t;

pub struct NvsAdapter {
    eeprom: [u8; EEPROM_SIZE],
    #[cfg(not(target_os = "espidf"))]
    store: HashMap<&'static CStr, Vec<u8>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter, initialise NVS flash and load the EEPROM image.
    ///
    /// Returns `Err(ConfigError::IoError)` if flash initialisation fails
    /// unrecoverably. On first boot or after a version mismatch the NVS
    /// partition is erased and re-initialised automatically.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        let mut adapter = Self::blank();
        adapter.load_eeprom();
        Ok(adapter)
    }

    fn blank() -> Self {
        Self {
            eeprom: [ERASED; EEPROM_SIZE],
            #[cfg(not(target_os = "espidf"))]
            store: HashMap::new(),
        }
    }

    fn load_eeprom(&mut self) {
        let mut image = [ERASED; EEPROM_SIZE];
        match self.read_blob(EEPROM_KEY, &mut image) {
            Ok(Some(EEPROM_SIZE)) => {
                self.eeprom = image;
                info!("NvsAdapter: EEPROM image loaded ({} bytes)", EEPROM_SIZE);
            }
            Ok(Some(len)) => {
                warn!(
                    "NvsAdapter: EEPROM image has {} bytes, expected {}; starting erased",
                    len, EEPROM_SIZE
                );
            }
            Ok(None) => info!("NvsAdapter: no EEPROM image, starting erased"),
            Err(e) => warn!("NvsAdapter: EEPROM read error {}, starting erased", e),
        }
    }

    /// Erase the emulated EEPROM (factory reset).  Calibrators seed their
    /// defaults again on the next `initialize`.
    pub fn erase_eeprom(&mut self) -> Result<(), StorageError> {
        let image = [ERASED; EEPROM_SIZE];
        self.write_blob(EEPROM_KEY, &image)
            .map_err(|_| StorageError::IoError)?;
        self.eeprom = image;
        Ok(())
    }

    /// Current EEPROM image, for diagnostics.
    pub fn eeprom_image(&self) -> &[u8; EEPROM_SIZE] {
        &self.eeprom
    }

    fn checked_range(address: usize, len: usize) -> Result<Range<usize>, StorageError> {
        address
            .checked_add(len)
            .filter(|end| *end <= EEPROM_SIZE)
            .map(|end| address..end)
            .ok_or(StorageError::OutOfBounds { address, len })
    }

    // ── Blob backend ──────────────────────────────────────────

    /// Read a blob into `buf`.  `Ok(None)` when the key does not exist.
    #[cfg(not(target_os = "espidf"))]
    fn read_blob(&self, key: &'static CStr, buf: &mut [u8]) -> Result<Option<usize>, BlobError> {
        Ok(self.store.get(key).map(|data| {
            let len = data.len().min(buf.len());
            buf[..len].copy_from_slice(&data[..len]);
            data.len()
        }))
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_blob(&mut self, key: &'static CStr, data: &[u8]) -> Result<(), BlobError> {
        self.store.insert(key, data.to_vec());
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn read_blob(&self, key: &'static CStr, buf: &mut [u8]) -> Result<Option<usize>, BlobError> {
        let result = Self::with_nvs_handle(false, |handle| {
            let mut size = buf.len();
            let ret = unsafe {
                nvs_get_blob(handle, key.as_ptr(), buf.as_mut_ptr() as *mut _, &mut size)
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(size)
        });
        match result {
            Ok(size) => Ok(Some(size)),
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(&mut self, key: &'static CStr, data: &[u8]) -> Result<(), BlobError> {
        Self::with_nvs_handle(true, |handle| {
            let ret = unsafe {
                nvs_set_blob(handle, key.as_ptr(), data.as_ptr() as *const _, data.len())
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        })
    }

    /// Open the probe namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, esp_err_t>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, esp_err_t>,
    {
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(NAMESPACE.as_ptr(), mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }
}

fn validate_config(cfg: &ProbeConfig) -> Result<(), ConfigError> {
    if (cfg.device_index as usize + 1) * SLOT_SIZE > EEPROM_SIZE {
        return Err(ConfigError::ValidationFailed(
            "device_index must be 0–7 (slot must fit the 64-byte EEPROM)",
        ));
    }
    if !(1000.0..=5500.0).contains(&cfg.adc_vref_mv) {
        return Err(ConfigError::ValidationFailed(
            "adc_vref_mv must be 1000.0–5500.0",
        ));
    }
    if cfg.adc_max_count < 255 {
        return Err(ConfigError::ValidationFailed(
            "adc_max_count must be 255–65535",
        ));
    }
    if cfg.averaging_samples == 0 || cfg.averaging_samples as usize > MAX_AVERAGING {
        return Err(ConfigError::ValidationFailed(
            "averaging_samples must be 1–32",
        ));
    }
    if !(-10.0..=80.0).contains(&cfg.ambient_temperature_c) {
        return Err(ConfigError::ValidationFailed(
            "ambient_temperature_c must be -10.0–80.0",
        ));
    }
    if !(100..=60_000).contains(&cfg.sample_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "sample_interval_ms must be 100–60000",
        ));
    }
    Ok(())
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<ProbeConfig, ConfigError> {
        let mut buf = [0u8; MAX_CONFIG_BLOB];
        match self.read_blob(CONFIG_KEY, &mut buf) {
            Ok(Some(len)) if len <= MAX_CONFIG_BLOB => {
                let cfg: ProbeConfig =
                    postcard::from_bytes(&buf[..len]).map_err(|_| ConfigError::Corrupted)?;
                info!("NvsAdapter: loaded config ({} bytes)", len);
                Ok(cfg)
            }
            Ok(Some(_)) => Err(ConfigError::Corrupted),
            Ok(None) => {
                info!("NvsAdapter: no stored config, using defaults");
                Ok(ProbeConfig::default())
            }
            Err(e) => {
                warn!("NvsAdapter: NVS read error {}, using defaults", e);
                Ok(ProbeConfig::default())
            }
        }
    }

    fn save(&mut self, config: &ProbeConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        match self.write_blob(CONFIG_KEY, &bytes) {
            Ok(()) => {
                info!("NvsAdapter: config saved ({} bytes)", bytes.len());
                Ok(())
            }
            Err(e) => {
                warn!("NvsAdapter: NVS write error {}", e);
                Err(ConfigError::IoError)
            }
        }
    }
}

impl ByteStorage for NvsAdapter {
    fn capacity(&self) -> usize {
        EEPROM_SIZE
    }

    fn read(&self, address: usize, buf: &mut [u8]) -> Result<(), StorageError> {
        let range = Self::checked_range(address, buf.len())?;
        buf.copy_from_slice(&self.eeprom[range]);
        Ok(())
    }

    fn write(&mut self, address: usize, data: &[u8]) -> Result<(), StorageError> {
        let range = Self::checked_range(address, data.len())?;
        let mut image = self.eeprom;
        image[range].copy_from_slice(data);
        if image == self.eeprom {
            // Unchanged bytes: skip the flash commit.
            return Ok(());
        }
        self.write_blob(EEPROM_KEY, &image).map_err(|e| {
            warn!("NvsAdapter: EEPROM commit error {}", e);
            StorageError::IoError
        })?;
        self.eeprom = image;
        Ok(())
    }
}

impl Default for NvsAdapter {
    fn default() -> Self {
        // Falls back to an erased, RAM-only image if NVS is unavailable.
        Self::new().unwrap_or_else(|_| Self::blank())
    }
}
