//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to              |
//! |----------------|--------------------|--------------------------|
//! | `hardware`     | SensorPort         | ESP32 ADC (pH probe)     |
//! | `log_sink`     | EventSink          | Serial log output        |
//! | `nvs`          | ByteStorage        | NVS-backed EEPROM image  |
//! |                | ConfigPort         | NVS / in-memory store    |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
