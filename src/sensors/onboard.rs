//! Onboard analog temperature sensor.
//!
//! The die sensor's output voltage falls linearly with temperature:
//!
//! ```text
//! V = raw * operating_voltage / bit_range
//! T = reference_temp - (V - reference_voltage) / slope
//! ```
//!
//! The sensor keeps lifetime minimum and maximum readings; they are never
//! reset while the firmware runs.  No alarm classification is applied here.

use serde::{Deserialize, Serialize};

use crate::app::ports::AnalogPort;
use crate::error::SensorError;
use crate::telemetry::record::{OnboardSample, RecordKind};

pub const ONBOARD_LOCATION: &str = "onboard";
pub const ONBOARD_SENSOR_ID: &str = "default";

/// Electrical constants for the linear die-temperature model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OnboardCalibration {
    /// ADC reference voltage (V).
    pub operating_voltage: f32,
    /// Full-scale raw ADC code.
    pub bit_range: u32,
    /// Temperature at which the sensor outputs `reference_voltage` (°C).
    pub reference_temp_c: f32,
    /// Sensor output at `reference_temp_c` (V).
    pub reference_voltage: f32,
    /// Output change per degree (V/°C).
    pub slope_v_per_c: f32,
}

impl Default for OnboardCalibration {
    fn default() -> Self {
        Self {
            operating_voltage: 3.3,
            bit_range: 65_535,
            reference_temp_c: 27.0,
            reference_voltage: 0.706,
            slope_v_per_c: 0.001_721,
        }
    }
}

impl OnboardCalibration {
    pub fn raw_to_voltage(&self, raw: u16) -> Result<f32, SensorError> {
        if self.bit_range == 0 {
            return Err(SensorError::InvalidCalibration);
        }
        Ok(f32::from(raw) * self.operating_voltage / self.bit_range as f32)
    }

    pub fn raw_to_celsius(&self, raw: u16) -> Result<f32, SensorError> {
        if self.slope_v_per_c == 0.0 {
            return Err(SensorError::InvalidCalibration);
        }
        let voltage = self.raw_to_voltage(raw)?;
        Ok(self.reference_temp_c - (voltage - self.reference_voltage) / self.slope_v_per_c)
    }
}

/// Onboard sensor with lifetime extrema.
pub struct OnboardSensor<A> {
    adc: A,
    calibration: OnboardCalibration,
    extrema: Option<(f32, f32)>,
}

impl<A: AnalogPort> OnboardSensor<A> {
    pub fn new(adc: A, calibration: OnboardCalibration) -> Self {
        Self {
            adc,
            calibration,
            extrema: None,
        }
    }

    /// Take one reading and fold it into the lifetime min/max.
    pub fn sample(&mut self, timestamp: u64) -> Result<OnboardSample, SensorError> {
        let raw = self.adc.read_raw()?;
        let value = self.calibration.raw_to_celsius(raw)?;

        let (min_c, max_c) = match self.extrema {
            Some((min, max)) => (min.min(value), max.max(value)),
            None => (value, value),
        };
        self.extrema = Some((min_c, max_c));

        Ok(OnboardSample {
            location: ONBOARD_LOCATION.into(),
            kind: RecordKind::Hardware,
            sensor: ONBOARD_SENSOR_ID.into(),
            value,
            max_c,
            min_c,
            timestamp,
        })
    }

    /// Lifetime `(min, max)`, `None` before the first sample.
    pub fn extrema(&self) -> Option<(f32, f32)> {
        self.extrema
    }
}
