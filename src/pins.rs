//! GPIO / peripheral pin assignments for the pond telemetry node.
//!
//! `main.rs` claims the typed peripherals matching these numbers; the
//! one-wire GPIO is also the default for `TelemetryConfig::bus_gpio`.

// ---------------------------------------------------------------------------
// One-wire temperature bus (DS18B20 probes, 4.7 kΩ pull-up to 3V3)
// ---------------------------------------------------------------------------

/// Open-drain data line shared by every external probe.
pub const ONEWIRE_GPIO: i32 = 16;

// ---------------------------------------------------------------------------
// Onboard analog temperature sensor (ADC1)
// ---------------------------------------------------------------------------

/// Linear analog sensor output.  ADC1 channel 3 (GPIO 4 on ESP32-S3).
pub const ONBOARD_ADC_GPIO: i32 = 4;

/// Native ADC resolution; readings are scaled up to the 16-bit range the
/// calibration expects.
pub const ADC_NATIVE_BITS: u32 = 12;

// ---------------------------------------------------------------------------
// Status LED (single discrete LED, active HIGH)
// ---------------------------------------------------------------------------

pub const STATUS_LED_GPIO: i32 = 2;
