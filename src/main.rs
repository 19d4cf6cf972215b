//! pH probe firmware — main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  HardwareAdapter   LogEventSink   NvsAdapter         │
//! │  (SensorPort)      (EventSink)    (ByteStorage +     │
//! │                                    ConfigPort)       │
//! │  ─────────────── Port Trait Boundary ─────────────   │
//! │  ┌────────────────────────────────────────────────┐  │
//! │  │  ProbeService · PhCalibrator (pure logic)      │  │
//! │  └────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! The loop only samples: calibration `ProbeCommand`s are expected from an
//! external driver (serial console, RPC) via `ProbeService::handle_command`.
#![deny(unused_must_use)]

use anyhow::{Result, anyhow};
use esp_idf_hal::delay::FreeRtos;
use log::{info, warn};

use phprobe::adapters::hardware::HardwareAdapter;
use phprobe::adapters::log_sink::LogEventSink;
use phprobe::adapters::nvs::NvsAdapter;
use phprobe::app::ports::ConfigPort;
use phprobe::app::service::ProbeService;
use phprobe::config::ProbeConfig;
use phprobe::drivers::hw_init;
use phprobe::pins;
use phprobe::sensors::ph_probe::PhProbe;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("phprobe v{}", env!("CARGO_PKG_VERSION"));

    hw_init::init_peripherals().map_err(|e| anyhow!("HAL init failed: {e}"))?;

    // ── 2. Storage + config ───────────────────────────────────
    let mut nvs = NvsAdapter::new().map_err(|e| anyhow!("NVS init failed: {e}"))?;
    let config = nvs.load().unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        ProbeConfig::default()
    });
    info!("Config: {:?}", config);

    // ── 3. Wire adapters into the service ─────────────────────
    let mut hw = HardwareAdapter::new(PhProbe::new(pins::PH_ADC_GPIO, &config));
    let mut sink = LogEventSink::new();
    let interval_ms = config.sample_interval_ms;
    let mut service = ProbeService::new(config);
    service.start(&mut nvs, &mut sink);

    // ── 4. Sampling loop ──────────────────────────────────────
    loop {
        service.tick(&mut hw, &mut sink);
        FreeRtos::delay_ms(interval_ms);
    }
}
