//! One-wire link layer: device addressing, CRC-8, ROM search and a
//! bit-banged standard-speed master over `embedded-hal` GPIO.
//!
//! The DS18x20 command layer in [`super::ds18x20`] sits on top of the
//! [`OneWireLink`] trait defined here, so the same command code runs
//! against real GPIO on the device and against the bit-level simulation
//! on the host.

use core::fmt::{self, Write as _};
use core::str::FromStr;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::BusError;

// ── ROM command set ───────────────────────────────────────────

pub const CMD_SEARCH_ROM: u8 = 0xF0;
pub const CMD_MATCH_ROM: u8 = 0x55;
pub const CMD_SKIP_ROM: u8 = 0xCC;

// ───────────────────────────────────────────────────────────────
// Device address
// ───────────────────────────────────────────────────────────────

/// 64-bit ROM code of a one-wire device, in bus order
/// (family code first, CRC last).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceAddress([u8; 8]);

impl DeviceAddress {
    pub const fn new(rom: [u8; 8]) -> Self {
        Self(rom)
    }

    pub const fn bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// Device family code (0x28 = DS18B20, 0x10 = DS18S20, 0x22 = DS1822).
    pub const fn family(&self) -> u8 {
        self.0[0]
    }

    /// `true` if the trailing byte is the CRC-8 of the first seven.
    pub fn crc_valid(&self) -> bool {
        crc8(&self.0[..7]) == self.0[7]
    }

    /// Lowercase hex rendering used on the wire and in the placement table.
    pub fn to_hex(&self) -> heapless::String<16> {
        let mut s = heapless::String::new();
        for b in self.0 {
            let _ = write!(s, "{b:02x}");
        }
        s
    }

    fn bit(&self, index: usize) -> bool {
        self.0[index / 8] & (1 << (index % 8)) != 0
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A placement key or wire value that is not 16 hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseAddressError;

impl fmt::Display for ParseAddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device address must be 16 hex digits")
    }
}

impl FromStr for DeviceAddress {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 16 || !s.is_ascii() {
            return Err(ParseAddressError);
        }
        let mut rom = [0u8; 8];
        for (i, byte) in rom.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).map_err(|_| ParseAddressError)?;
        }
        Ok(Self(rom))
    }
}

impl Serialize for DeviceAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for DeviceAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ───────────────────────────────────────────────────────────────
// CRC-8 (Dallas/Maxim, reflected polynomial 0x8C)
// ───────────────────────────────────────────────────────────────

pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        let mut byte = byte;
        for _ in 0..8 {
            let mix = (crc ^ byte) & 0x01;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8C;
            }
            byte >>= 1;
        }
    }
    crc
}

// ───────────────────────────────────────────────────────────────
// Link trait
// ───────────────────────────────────────────────────────────────

/// Bit-level access to a one-wire bus.  Bytes go LSB first.
pub trait OneWireLink {
    /// Issue a reset pulse.  Returns `true` if at least one device
    /// answered with a presence pulse.
    fn reset(&mut self) -> Result<bool, BusError>;

    fn write_bit(&mut self, bit: bool) -> Result<(), BusError>;

    fn read_bit(&mut self) -> Result<bool, BusError>;

    fn write_byte(&mut self, byte: u8) -> Result<(), BusError> {
        for i in 0..8 {
            self.write_bit(byte & (1 << i) != 0)?;
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, BusError> {
        let mut byte = 0u8;
        for i in 0..8 {
            if self.read_bit()? {
                byte |= 1 << i;
            }
        }
        Ok(byte)
    }

    /// Reset and address one device (`Some`) or every device (`None`).
    fn select(&mut self, address: Option<&DeviceAddress>) -> Result<(), BusError> {
        if !self.reset()? {
            return Err(BusError::NoPresence);
        }
        match address {
            Some(addr) => {
                self.write_byte(CMD_MATCH_ROM)?;
                for &b in addr.bytes() {
                    self.write_byte(b)?;
                }
            }
            None => self.write_byte(CMD_SKIP_ROM)?,
        }
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// ROM search
// ───────────────────────────────────────────────────────────────

/// Enumerate every device on the bus (Maxim search algorithm).
///
/// A bus with no presence pulse yields an empty list, not an error.
/// Each ROM is CRC-checked; a corrupted search aborts with
/// [`BusError::CrcMismatch`].  The search ends when no unexplored branch
/// remains, or early if a pass returns a ROM already found.
pub fn search<L: OneWireLink + ?Sized>(link: &mut L) -> Result<Vec<DeviceAddress>, BusError> {
    let mut found = Vec::new();
    let mut rom = DeviceAddress([0; 8]);
    let mut last_discrepancy: Option<usize> = None;

    loop {
        if !link.reset()? {
            return Ok(found);
        }
        link.write_byte(CMD_SEARCH_ROM)?;

        let mut last_zero: Option<usize> = None;
        for index in 0..64 {
            let id_bit = link.read_bit()?;
            let cmp_bit = link.read_bit()?;
            let direction = match (id_bit, cmp_bit) {
                // Nobody left on the bus (device vanished mid-search).
                (true, true) => return Ok(found),
                (false, true) => false,
                (true, false) => true,
                (false, false) => {
                    let dir = match last_discrepancy {
                        Some(ld) if index < ld => rom.bit(index),
                        Some(ld) => index == ld,
                        None => false,
                    };
                    if !dir {
                        last_zero = Some(index);
                    }
                    dir
                }
            };
            let mask = 1 << (index % 8);
            if direction {
                rom.0[index / 8] |= mask;
            } else {
                rom.0[index / 8] &= !mask;
            }
            link.write_bit(direction)?;
        }

        if !rom.crc_valid() {
            return Err(BusError::CrcMismatch);
        }
        if found.contains(&rom) {
            warn!(
                "onewire: search revisited {} after {} device(s), stopping",
                rom,
                found.len()
            );
            return Ok(found);
        }
        debug!("onewire: found {}", rom);
        found.push(rom);

        match last_zero {
            Some(z) => last_discrepancy = Some(z),
            None => return Ok(found),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Bit-banged master
// ───────────────────────────────────────────────────────────────

/// Runs one time-critical part of a bus slot.
///
/// Everything between pulling the line low and sampling it (or releasing
/// it, for a write) happens inside [`run`](Self::run).  Recovery gaps are
/// outside it.
pub trait SlotGuard {
    fn run<R>(&mut self, slot: impl FnOnce() -> R) -> R;
}

/// No masking.  Slot timing is only as good as the scheduler allows.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unguarded;

impl SlotGuard for Unguarded {
    fn run<R>(&mut self, slot: impl FnOnce() -> R) -> R {
        slot()
    }
}

/// Interrupts masked on the current core for the duration of a slot.
#[cfg(target_os = "espidf")]
#[derive(Debug, Default, Clone, Copy)]
pub struct InterruptsMasked;

#[cfg(target_os = "espidf")]
impl SlotGuard for InterruptsMasked {
    fn run<R>(&mut self, slot: impl FnOnce() -> R) -> R {
        esp_idf_hal::interrupt::free(slot)
    }
}

/// Standard-speed one-wire master on a single open-drain GPIO.
///
/// `P` must drive low on `set_low()` and release the line (external
/// pull-up) on `set_high()`.
pub struct BitBangLink<P, D, G = Unguarded> {
    pin: P,
    delay: D,
    guard: G,
}

impl<P, D> BitBangLink<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    pub fn new(pin: P, delay: D) -> Result<Self, BusError> {
        Self::with_guard(pin, delay, Unguarded)
    }
}

impl<P, D, G> BitBangLink<P, D, G>
where
    P: InputPin + OutputPin,
    D: DelayNs,
    G: SlotGuard,
{
    pub fn with_guard(mut pin: P, delay: D, guard: G) -> Result<Self, BusError> {
        pin.set_high().map_err(|_| BusError::Pin)?;
        Ok(Self { pin, delay, guard })
    }
}

fn low(pin: &mut impl OutputPin) -> Result<(), BusError> {
    pin.set_low().map_err(|_| BusError::Pin)
}

fn release(pin: &mut impl OutputPin) -> Result<(), BusError> {
    pin.set_high().map_err(|_| BusError::Pin)
}

fn sample(pin: &mut impl InputPin) -> Result<bool, BusError> {
    pin.is_high().map_err(|_| BusError::Pin)
}

impl<P, D, G> OneWireLink for BitBangLink<P, D, G>
where
    P: InputPin + OutputPin,
    D: DelayNs,
    G: SlotGuard,
{
    fn reset(&mut self) -> Result<bool, BusError> {
        let Self { pin, delay, guard } = self;
        low(pin)?;
        delay.delay_us(480);
        let presence = guard.run(|| {
            release(pin)?;
            delay.delay_us(70);
            sample(pin).map(|high| !high)
        })?;
        delay.delay_us(410);
        Ok(presence)
    }

    fn write_bit(&mut self, bit: bool) -> Result<(), BusError> {
        let Self { pin, delay, guard } = self;
        let (low_us, recover_us) = if bit { (6, 64) } else { (60, 10) };
        guard.run(|| {
            low(pin)?;
            delay.delay_us(low_us);
            release(pin)
        })?;
        delay.delay_us(recover_us);
        Ok(())
    }

    fn read_bit(&mut self) -> Result<bool, BusError> {
        let Self { pin, delay, guard } = self;
        let bit = guard.run(|| {
            low(pin)?;
            delay.delay_us(6);
            release(pin)?;
            delay.delay_us(9);
            sample(pin)
        })?;
        delay.delay_us(55);
        Ok(bit)
    }
}
