//! DS18x20 temperature sensor command layer.
//!
//! Implements [`OneWirePort`] on top of any [`OneWireLink`]:
//!
//! - `start_conversion` — SKIP ROM + CONVERT T, all devices at once
//! - `read_temperature` — MATCH ROM + READ SCRATCHPAD, CRC-checked
//! - `read_resolution`  — configuration byte (scratchpad\[4\]) bits 5–6
//!
//! Conversion is not awaited here; the caller owns the 750 ms settle
//! delay so the bus driver never blocks.

use log::debug;

use crate::app::ports::OneWirePort;
use crate::error::BusError;

use super::onewire::{self, DeviceAddress, OneWireLink};

pub const CMD_CONVERT_T: u8 = 0x44;
pub const CMD_READ_SCRATCHPAD: u8 = 0xBE;

pub const FAMILY_DS18S20: u8 = 0x10;
pub const FAMILY_DS1822: u8 = 0x22;
pub const FAMILY_DS18B20: u8 = 0x28;

/// Worst-case conversion time at 12-bit resolution.
pub const CONVERSION_DELAY_MS: u32 = 750;

const SCRATCHPAD_LEN: usize = 9;

// ───────────────────────────────────────────────────────────────
// Resolution
// ───────────────────────────────────────────────────────────────

/// Two-bit resolution code from the configuration register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution(u8);

impl Resolution {
    /// Extract the code from a raw configuration byte.
    pub const fn from_config(config: u8) -> Self {
        Self((config >> 5) & 0x03)
    }

    /// Raw code, 0..=3.
    pub const fn code(self) -> u8 {
        self.0
    }

    /// The `resolution_bits` figure reported on the wire: `code * 9 + 9`.
    pub const fn bits(self) -> u8 {
        self.0 * 9 + 9
    }
}

// ───────────────────────────────────────────────────────────────
// Scratchpad decoding
// ───────────────────────────────────────────────────────────────

/// Decode the temperature registers of a CRC-checked scratchpad.
pub fn decode_temperature(family: u8, sp: &[u8; SCRATCHPAD_LEN]) -> Result<f32, BusError> {
    match family {
        FAMILY_DS18B20 | FAMILY_DS1822 => {
            let code = Resolution::from_config(sp[4]).code();
            // Low bits are undefined below 12-bit resolution.
            let undefined = 3 - code;
            let raw = i16::from_le_bytes([sp[0], sp[1]]) & !((1i16 << undefined) - 1);
            Ok(f32::from(raw) / 16.0)
        }
        FAMILY_DS18S20 => {
            let raw = i16::from_le_bytes([sp[0], sp[1]]);
            let whole = f32::from(raw >> 1);
            let count_remain = f32::from(sp[6]);
            let count_per_c = f32::from(sp[7]);
            if sp[7] == 0 {
                return Ok(f32::from(raw) / 2.0);
            }
            Ok(whole - 0.25 + (count_per_c - count_remain) / count_per_c)
        }
        other => Err(BusError::UnsupportedFamily(other)),
    }
}

// ───────────────────────────────────────────────────────────────
// Bus driver
// ───────────────────────────────────────────────────────────────

/// DS18x20 family driver for a whole bus segment.
pub struct Ds18x20Bus<L> {
    link: L,
}

impl<L: OneWireLink> Ds18x20Bus<L> {
    pub fn new(link: L) -> Self {
        Self { link }
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Read and CRC-check the 9-byte scratchpad of one device.
    pub fn read_scratchpad(
        &mut self,
        address: &DeviceAddress,
    ) -> Result<[u8; SCRATCHPAD_LEN], BusError> {
        self.link.select(Some(address))?;
        self.link.write_byte(CMD_READ_SCRATCHPAD)?;
        let mut sp = [0u8; SCRATCHPAD_LEN];
        for byte in &mut sp {
            *byte = self.link.read_byte()?;
        }
        if onewire::crc8(&sp[..8]) != sp[8] {
            debug!("ds18x20: scratchpad CRC mismatch on {}", address);
            return Err(BusError::CrcMismatch);
        }
        Ok(sp)
    }
}

impl<L: OneWireLink> OneWirePort for Ds18x20Bus<L> {
    fn discover(&mut self) -> Result<Vec<DeviceAddress>, BusError> {
        onewire::search(&mut self.link)
    }

    fn start_conversion(&mut self) -> Result<(), BusError> {
        self.link.select(None)?;
        self.link.write_byte(CMD_CONVERT_T)
    }

    fn read_temperature(&mut self, address: &DeviceAddress) -> Result<f32, BusError> {
        let sp = self.read_scratchpad(address)?;
        decode_temperature(address.family(), &sp)
    }

    fn read_resolution(&mut self, address: &DeviceAddress) -> Result<Resolution, BusError> {
        let sp = self.read_scratchpad(address)?;
        Ok(Resolution::from_config(sp[4]))
    }
}
