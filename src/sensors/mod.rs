//! Sensor subsystem — the one-wire bus, the DS18x20 command layer, the
//! onboard analog sensor and per-device measurement derivation.
//!
//! ```text
//!  OneWireLink ──▶ Ds18x20Bus (OneWirePort) ──▶ reading::measure ──▶ Measurement
//!  AnalogPort  ──▶ OnboardSensor              ──────────────────────▶ OnboardSample
//! ```

pub mod ds18x20;
pub mod onboard;
pub mod onewire;
pub mod reading;

pub use ds18x20::{Ds18x20Bus, Resolution};
pub use onboard::{OnboardCalibration, OnboardSensor};
pub use onewire::{BitBangLink, DeviceAddress, OneWireLink, SlotGuard, Unguarded};
pub use reading::AlarmThresholds;
