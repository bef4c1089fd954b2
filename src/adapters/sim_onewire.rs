//! Bit-level simulation of a one-wire bus populated with DS18B20 devices.
//!
//! Implements [`OneWireLink`] so the real ROM search and DS18x20 command
//! code in [`crate::sensors`] runs unchanged on the host.  The simulation
//! models the wired-AND line: during a search each still-selected device
//! drives its ROM bit and its complement, and the master reads the AND of
//! everything on the wire.
//!
//! Scratchpads use the DS18B20/DS1822 register layout.  Until the first
//! CONVERT T a device reports the 85 °C power-on value, like the real part.

use crate::error::BusError;
use crate::sensors::ds18x20::{CMD_CONVERT_T, CMD_READ_SCRATCHPAD, FAMILY_DS18B20};
use crate::sensors::onewire::{
    CMD_MATCH_ROM, CMD_SEARCH_ROM, CMD_SKIP_ROM, DeviceAddress, OneWireLink, crc8,
};

/// Raw register value a DS18B20 holds after power-up (+85 °C).
const POWER_ON_RAW: i16 = 0x0550;

/// One simulated sensor.
#[derive(Debug, Clone)]
pub struct SimDevice {
    address: DeviceAddress,
    temperature_c: f32,
    config: u8,
    converted: Option<i16>,
    corrupt_scratchpad: bool,
    present: bool,
}

impl SimDevice {
    /// Device with an explicit ROM (should carry a valid CRC).
    pub fn new(address: DeviceAddress, temperature_c: f32) -> Self {
        Self {
            address,
            temperature_c,
            config: 0x7F,
            converted: None,
            corrupt_scratchpad: false,
            present: true,
        }
    }

    /// DS18B20 with the given 48-bit serial and a computed ROM CRC.
    pub fn ds18b20(serial: [u8; 6], temperature_c: f32) -> Self {
        let mut rom = [0u8; 8];
        rom[0] = FAMILY_DS18B20;
        rom[1..7].copy_from_slice(&serial);
        rom[7] = crc8(&rom[..7]);
        Self::new(DeviceAddress::new(rom), temperature_c)
    }

    /// Configuration register, resolution in bits 5–6.
    #[must_use]
    pub fn with_config(mut self, config: u8) -> Self {
        self.config = config;
        self
    }

    pub fn address(&self) -> DeviceAddress {
        self.address
    }

    fn convert(&mut self) {
        let undefined = 3 - ((self.config >> 5) & 0x03);
        let raw = (self.temperature_c * 16.0).round() as i16;
        self.converted = Some(raw & !((1i16 << undefined) - 1));
    }

    fn scratchpad(&self) -> [u8; 9] {
        let [lo, hi] = self.converted.unwrap_or(POWER_ON_RAW).to_le_bytes();
        let mut sp = [lo, hi, 0x4B, 0x46, self.config, 0xFF, 0x0C, 0x10, 0];
        sp[8] = crc8(&sp[..8]);
        if self.corrupt_scratchpad {
            sp[8] ^= 0xFF;
        }
        sp
    }

    fn rom_bit(&self, index: usize) -> bool {
        self.address.bytes()[index / 8] & (1 << (index % 8)) != 0
    }
}

/// Where the bus is inside the current transaction.
#[derive(Debug)]
enum Phase {
    /// No reset since the last transaction ended; the line idles high.
    Idle,
    /// Collecting the ROM command byte.
    Rom { byte: u8, bits: u8 },
    /// ROM search: `step` 0 = id bit, 1 = complement, 2 = master direction.
    Search { index: usize, step: u8 },
    /// Collecting the 8 MATCH ROM bytes.
    Match { rom: [u8; 8], bits: usize },
    /// Collecting the function command byte.
    Function { byte: u8, bits: u8 },
    /// Shifting a scratchpad out to the master.
    Reading { data: [u8; 9], bit: usize },
}

/// Simulated bus segment.
#[derive(Debug)]
pub struct SimOneWireNetwork {
    devices: Vec<SimDevice>,
    /// Per-device selection for the current transaction.
    selected: Vec<bool>,
    phase: Phase,
    resets: u32,
}

impl SimOneWireNetwork {
    pub fn new(devices: Vec<SimDevice>) -> Self {
        let selected = vec![false; devices.len()];
        Self {
            devices,
            selected,
            phase: Phase::Idle,
            resets: 0,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn attach(&mut self, device: SimDevice) {
        self.devices.push(device);
        self.selected.push(false);
    }

    pub fn set_temperature(&mut self, address: &DeviceAddress, celsius: f32) {
        if let Some(d) = self.device_mut(address) {
            d.temperature_c = celsius;
        }
    }

    /// Make every scratchpad read from `address` fail its CRC check.
    pub fn corrupt_reads(&mut self, address: &DeviceAddress, corrupt: bool) {
        if let Some(d) = self.device_mut(address) {
            d.corrupt_scratchpad = corrupt;
        }
    }

    /// Electrically connect or disconnect a device.
    pub fn set_present(&mut self, address: &DeviceAddress, present: bool) {
        if let Some(d) = self.device_mut(address) {
            d.present = present;
        }
    }

    /// Reset pulses seen so far.
    pub fn resets(&self) -> u32 {
        self.resets
    }

    fn device_mut(&mut self, address: &DeviceAddress) -> Option<&mut SimDevice> {
        self.devices.iter_mut().find(|d| d.address == *address)
    }

    fn select_all_present(&mut self) {
        for (sel, dev) in self.selected.iter_mut().zip(&self.devices) {
            *sel = dev.present;
        }
    }

    fn selected_devices(&self) -> impl Iterator<Item = &SimDevice> {
        self.devices
            .iter()
            .zip(&self.selected)
            .filter_map(|(d, &s)| s.then_some(d))
    }

    fn on_rom_command(&mut self, cmd: u8) {
        self.phase = match cmd {
            CMD_SEARCH_ROM => {
                self.select_all_present();
                Phase::Search { index: 0, step: 0 }
            }
            CMD_MATCH_ROM => Phase::Match {
                rom: [0; 8],
                bits: 0,
            },
            CMD_SKIP_ROM => {
                self.select_all_present();
                Phase::Function { byte: 0, bits: 0 }
            }
            _ => Phase::Idle,
        };
    }

    fn on_function_command(&mut self, cmd: u8) {
        self.phase = match cmd {
            CMD_CONVERT_T => {
                for (dev, &sel) in self.devices.iter_mut().zip(&self.selected) {
                    if sel {
                        dev.convert();
                    }
                }
                Phase::Idle
            }
            CMD_READ_SCRATCHPAD => {
                let mut chosen = self.selected_devices();
                match (chosen.next(), chosen.next()) {
                    (Some(dev), None) => Phase::Reading {
                        data: dev.scratchpad(),
                        bit: 0,
                    },
                    // Nobody or a bus collision: the master reads ones.
                    _ => Phase::Idle,
                }
            }
            _ => Phase::Idle,
        };
    }
}

impl OneWireLink for SimOneWireNetwork {
    fn reset(&mut self) -> Result<bool, BusError> {
        self.resets += 1;
        self.selected.iter_mut().for_each(|s| *s = false);
        let presence = self.devices.iter().any(|d| d.present);
        self.phase = if presence {
            Phase::Rom { byte: 0, bits: 0 }
        } else {
            Phase::Idle
        };
        Ok(presence)
    }

    fn write_bit(&mut self, bit: bool) -> Result<(), BusError> {
        match &mut self.phase {
            Phase::Rom { byte, bits } | Phase::Function { byte, bits } => {
                if bit {
                    *byte |= 1 << *bits;
                }
                *bits += 1;
                if *bits == 8 {
                    let cmd = *byte;
                    if matches!(self.phase, Phase::Rom { .. }) {
                        self.on_rom_command(cmd);
                    } else {
                        self.on_function_command(cmd);
                    }
                }
            }
            Phase::Match { rom, bits } => {
                if bit {
                    rom[*bits / 8] |= 1 << (*bits % 8);
                }
                *bits += 1;
                if *bits == 64 {
                    let target = DeviceAddress::new(*rom);
                    for (sel, dev) in self.selected.iter_mut().zip(&self.devices) {
                        *sel = dev.present && dev.address == target;
                    }
                    self.phase = Phase::Function { byte: 0, bits: 0 };
                }
            }
            Phase::Search { index, step } if *step == 2 => {
                let i = *index;
                for (sel, dev) in self.selected.iter_mut().zip(&self.devices) {
                    if *sel && dev.rom_bit(i) != bit {
                        *sel = false;
                    }
                }
                self.phase = if i == 63 {
                    Phase::Idle
                } else {
                    Phase::Search {
                        index: i + 1,
                        step: 0,
                    }
                };
            }
            _ => {}
        }
        Ok(())
    }

    fn read_bit(&mut self) -> Result<bool, BusError> {
        let bit = match &mut self.phase {
            Phase::Search { index, step } if *step < 2 => {
                let (i, complement) = (*index, *step == 1);
                *step += 1;
                // Wired-AND: any device driving 0 pulls the line low.
                self.devices
                    .iter()
                    .zip(&self.selected)
                    .filter(|(_, s)| **s)
                    .all(|(d, _)| d.rom_bit(i) != complement)
            }
            Phase::Reading { data, bit } => {
                let value = data
                    .get(*bit / 8)
                    .is_none_or(|byte| byte & (1 << (*bit % 8)) != 0);
                *bit += 1;
                value
            }
            _ => true,
        };
        Ok(bit)
    }
}
