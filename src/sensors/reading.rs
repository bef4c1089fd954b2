//! Per-device measurement derivation.
//!
//! After a bus conversion has settled, every discovered address becomes
//! one [`Measurement`]: temperature, resolution, placement lookup and
//! alarm classification.  A failed read is returned as-is; there are no
//! per-sensor retries.

use serde::{Deserialize, Serialize};

use crate::app::ports::OneWirePort;
use crate::config::TelemetryConfig;
use crate::error::BusError;
use crate::telemetry::record::{Measurement, RecordKind};

use super::onewire::DeviceAddress;

/// Location reported for an address missing from the placement table.
pub const LOCATION_UNPLACED: &str = "None";

/// Process-wide alarm band for external sensors (°C, exclusive bounds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlarmThresholds {
    pub low_c: f32,
    pub high_c: f32,
}

impl Default for AlarmThresholds {
    fn default() -> Self {
        Self {
            low_c: 20.0,
            high_c: 25.0,
        }
    }
}

impl AlarmThresholds {
    /// Values exactly on a threshold are not alarmed.
    pub fn is_alarm(&self, value_c: f32) -> bool {
        value_c < self.low_c || value_c > self.high_c
    }
}

/// Read one device and build its measurement record.
pub fn measure(
    bus: &mut impl OneWirePort,
    address: &DeviceAddress,
    config: &TelemetryConfig,
    timestamp: u64,
) -> Result<Measurement, BusError> {
    let value = bus.read_temperature(address)?;
    let resolution = bus.read_resolution(address)?;

    Ok(Measurement {
        kind: RecordKind::Hardware,
        value,
        sensor: *address,
        location: config.location_of(address).into(),
        timestamp,
        resolution_raw: resolution.code(),
        resolution_bits: resolution.bits(),
        alarm: config.alarm.is_alarm(value),
    })
}
