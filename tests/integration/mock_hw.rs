//! Mock adapters for integration tests.
//!
//! Every port the cycle loop and link manager touch has a recording
//! double here, so tests can assert on the full interaction history
//! without touching real GPIO, radios or sockets.

use std::cell::Cell;
use std::collections::VecDeque;
use std::net::SocketAddrV4;

use embedded_hal::delay::DelayNs;
use pondtemp::app::events::AppEvent;
use pondtemp::app::ports::{
    AnalogPort, ClockPort, DatagramPort, EventSink, IndicatorPort, OneWirePort,
};
use pondtemp::error::{BusError, SensorError, TransportError};
use pondtemp::sensors::{DeviceAddress, Resolution};
use pondtemp::telemetry::TelemetryBatch;

pub const PUMP_HOUSING: &str = "28fd93df0d000054";
pub const POND_A: &str = "2825d05704e13c71";
pub const POND_B: &str = "287e9d5704e13ca2";
pub const UNPLACED: &str = "28aabbccddeeff00";

pub fn addr(hex: &str) -> DeviceAddress {
    hex.parse().unwrap()
}

// ── MockBus ───────────────────────────────────────────────────

/// Scripted one-wire bus.
///
/// `scans` is consumed one entry per `discover()`; the last entry repeats.
pub struct MockBus {
    pub scans: VecDeque<Result<Vec<DeviceAddress>, BusError>>,
    pub temperatures: Vec<(DeviceAddress, f32)>,
    pub config_byte: u8,
    pub conversions: u32,
    pub discover_calls: u32,
    /// Fail the next read of this device, once.
    pub fail_next_read: Option<(DeviceAddress, BusError)>,
    pub fail_conversion: Option<BusError>,
}

#[allow(dead_code)]
impl MockBus {
    pub fn with_devices(devices: &[(&str, f32)]) -> Self {
        let temperatures: Vec<_> = devices.iter().map(|(h, t)| (addr(h), *t)).collect();
        let found = temperatures.iter().map(|(a, _)| *a).collect();
        Self {
            scans: VecDeque::from([Ok(found)]),
            temperatures,
            config_byte: 0x7F,
            conversions: 0,
            discover_calls: 0,
            fail_next_read: None,
            fail_conversion: None,
        }
    }

    pub fn set_temperature(&mut self, hex: &str, celsius: f32) {
        let a = addr(hex);
        if let Some(entry) = self.temperatures.iter_mut().find(|(d, _)| *d == a) {
            entry.1 = celsius;
        }
    }
}

impl OneWirePort for MockBus {
    fn discover(&mut self) -> Result<Vec<DeviceAddress>, BusError> {
        self.discover_calls += 1;
        if self.scans.len() > 1 {
            self.scans.pop_front().unwrap_or(Ok(Vec::new()))
        } else {
            self.scans.front().cloned().unwrap_or(Ok(Vec::new()))
        }
    }

    fn start_conversion(&mut self) -> Result<(), BusError> {
        if let Some(e) = self.fail_conversion {
            return Err(e);
        }
        self.conversions += 1;
        Ok(())
    }

    fn read_temperature(&mut self, address: &DeviceAddress) -> Result<f32, BusError> {
        if let Some((target, err)) = self.fail_next_read {
            if target == *address {
                self.fail_next_read = None;
                return Err(err);
            }
        }
        self.temperatures
            .iter()
            .find(|(a, _)| a == address)
            .map(|(_, t)| *t)
            .ok_or(BusError::NoPresence)
    }

    fn read_resolution(&mut self, _address: &DeviceAddress) -> Result<Resolution, BusError> {
        Ok(Resolution::from_config(self.config_byte))
    }
}

// ── MockAdc ───────────────────────────────────────────────────

/// ADC that returns the raw code for a given voltage (default 0.706 V,
/// i.e. the reference temperature).
pub struct MockAdc {
    pub raw: u16,
    pub fail: bool,
}

#[allow(dead_code)]
impl MockAdc {
    pub fn at_voltage(volts: f32) -> Self {
        Self {
            raw: (volts / 3.3 * 65_535.0).round() as u16,
            fail: false,
        }
    }
}

impl Default for MockAdc {
    fn default() -> Self {
        Self::at_voltage(0.706)
    }
}

impl AnalogPort for MockAdc {
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        if self.fail {
            return Err(SensorError::AdcReadFailed);
        }
        Ok(self.raw)
    }
}

// ── FakeClock ─────────────────────────────────────────────────

/// Clock that advances one second per query.
pub struct FakeClock {
    pub now: Cell<u64>,
}

impl FakeClock {
    pub fn starting_at(epoch: u64) -> Self {
        Self {
            now: Cell::new(epoch),
        }
    }
}

impl ClockPort for FakeClock {
    fn epoch_secs(&self) -> u64 {
        let t = self.now.get();
        self.now.set(t + 1);
        t
    }
}

// ── MockTransport ─────────────────────────────────────────────

#[derive(Default)]
pub struct MockTransport {
    pub sent: Vec<(Vec<u8>, SocketAddrV4)>,
    pub fail_next: bool,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn last_batch(&self) -> TelemetryBatch {
        let (payload, _) = self.sent.last().expect("nothing was sent");
        TelemetryBatch::decode(payload).expect("payload is not a telemetry batch")
    }
}

impl DatagramPort for MockTransport {
    fn send_to(
        &mut self,
        payload: &[u8],
        destination: SocketAddrV4,
    ) -> Result<usize, TransportError> {
        if self.fail_next {
            self.fail_next = false;
            return Err(TransportError::SendFailed);
        }
        self.sent.push((payload.to_vec(), destination));
        Ok(payload.len())
    }
}

// ── MockIndicator ─────────────────────────────────────────────

#[derive(Default)]
pub struct MockIndicator {
    pub levels: Vec<bool>,
}

#[allow(dead_code)]
impl MockIndicator {
    pub fn is_on(&self) -> Option<bool> {
        self.levels.last().copied()
    }

    pub fn off_pulses(&self) -> usize {
        self.levels.iter().filter(|on| !**on).count()
    }
}

impl IndicatorPort for MockIndicator {
    fn set(&mut self, on: bool) {
        self.levels.push(on);
    }
}

// ── RecordingDelay ────────────────────────────────────────────

/// Delay that returns immediately and records every millisecond wait.
#[derive(Default)]
pub struct RecordingDelay {
    pub waits_ms: Vec<u32>,
    pub total_ns: u64,
}

#[allow(dead_code)]
impl RecordingDelay {
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }

    pub fn count_of(&self, ms: u32) -> usize {
        self.waits_ms.iter().filter(|w| **w == ms).count()
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.waits_ms.push(ms);
        self.total_ns += u64::from(ms) * 1_000_000;
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
