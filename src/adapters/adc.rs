//! Onboard sensor ADC adapter.
//!
//! The calibration model works on 16-bit codes (`bit_range = 65535`); the
//! ESP32 one-shot ADC delivers 12-bit codes, so readings are scaled up
//! before they reach the domain.

#[cfg(target_os = "espidf")]
use core::borrow::Borrow;

#[cfg(target_os = "espidf")]
use esp_idf_hal::adc::oneshot::{AdcChannelDriver, AdcDriver};
#[cfg(target_os = "espidf")]
use esp_idf_hal::gpio::ADCPin;
#[cfg(target_os = "espidf")]
use log::warn;

#[cfg(target_os = "espidf")]
use crate::app::ports::AnalogPort;
#[cfg(target_os = "espidf")]
use crate::error::SensorError;

/// Stretch a `native_bits` code over the full `u16` range.
pub fn scale_to_16_bit(raw: u16, native_bits: u32) -> u16 {
    if native_bits == 0 || native_bits >= 16 {
        return raw;
    }
    let max = (1u32 << native_bits) - 1;
    let raw = u32::from(raw).min(max);
    (raw * u32::from(u16::MAX) / max) as u16
}

/// One-shot ADC channel feeding the onboard sensor.
#[cfg(target_os = "espidf")]
pub struct EspAdc<'d, T, M>
where
    T: ADCPin,
    M: Borrow<AdcDriver<'d, T::Adc>>,
{
    channel: AdcChannelDriver<'d, T, M>,
}

#[cfg(target_os = "espidf")]
impl<'d, T, M> EspAdc<'d, T, M>
where
    T: ADCPin,
    M: Borrow<AdcDriver<'d, T::Adc>>,
{
    pub fn new(channel: AdcChannelDriver<'d, T, M>) -> Self {
        Self { channel }
    }
}

#[cfg(target_os = "espidf")]
impl<'d, T, M> AnalogPort for EspAdc<'d, T, M>
where
    T: ADCPin,
    M: Borrow<AdcDriver<'d, T::Adc>>,
{
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        let raw = self.channel.read_raw().map_err(|e| {
            warn!("adc: read failed: {}", e);
            SensorError::AdcReadFailed
        })?;
        Ok(scale_to_16_bit(raw, crate::pins::ADC_NATIVE_BITS))
    }
}
