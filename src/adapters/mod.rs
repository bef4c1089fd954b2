//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements       | Connects to                      |
//! |----------------|------------------|----------------------------------|
//! | `adc`          | AnalogPort       | ESP32 one-shot ADC (espidf)      |
//! | `clock`        | ClockPort        | SNTP-synced system clock         |
//! | `log_sink`     | EventSink        | Serial log output                |
//! | `sim_onewire`  | OneWireLink      | Simulated DS18B20 bus (host)     |
//! | `udp`          | DatagramPort     | UDP broadcast socket             |
//! | `wifi`         | LinkPort         | ESP-IDF WiFi STA / simulation    |
//!
//! The one-wire GPIO master itself lives in
//! [`sensors::onewire`](crate::sensors::onewire) since it is pure
//! `embedded-hal` code.

pub mod adc;
pub mod clock;
pub mod log_sink;
#[cfg(not(target_os = "espidf"))]
pub mod sim_onewire;
pub mod udp;
pub mod wifi;
