//! Port traits — the hexagonal boundary between the telemetry cycle and
//! the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ CycleLoop / LinkManager (domain)
//! ```
//!
//! Driven adapters (bus driver, ADC, radio, socket, LED, clock, event
//! sinks) implement these traits.  The domain consumes them via generics,
//! so the cycle never touches hardware directly and every path runs on
//! the host against mocks.
//!
//! Delays are not a port of their own: the domain takes any
//! `embedded_hal::delay::DelayNs`.

use std::net::SocketAddrV4;

use crate::config::Credentials;
use crate::error::{BusError, LinkError, SensorError, TransportError};
use crate::sensors::ds18x20::Resolution;
use crate::sensors::onewire::DeviceAddress;

// ───────────────────────────────────────────────────────────────
// One-wire bus port (hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Temperature-sensor bus segment.
pub trait OneWirePort {
    /// Scan the bus.  An empty bus is `Ok(vec![])`, not an error.
    fn discover(&mut self) -> Result<Vec<DeviceAddress>, BusError>;

    /// Broadcast "begin conversion" to every device.  Does not wait.
    fn start_conversion(&mut self) -> Result<(), BusError>;

    /// Latest converted temperature (°C).  Only meaningful once the
    /// conversion delay has elapsed after [`start_conversion`](Self::start_conversion).
    fn read_temperature(&mut self, address: &DeviceAddress) -> Result<f32, BusError>;

    /// Two-bit resolution code from the device's configuration byte.
    fn read_resolution(&mut self, address: &DeviceAddress) -> Result<Resolution, BusError>;
}

// ───────────────────────────────────────────────────────────────
// Analog port (hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Raw 16-bit sample from the onboard sensor's ADC channel.
pub trait AnalogPort {
    fn read_raw(&mut self) -> Result<u16, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Network ports (domain ↔ radio / socket)
// ───────────────────────────────────────────────────────────────

/// Station-mode network interface driven by
/// [`LinkManager`](super::link::LinkManager).
pub trait LinkPort {
    /// Bring the interface up with the given credentials.
    fn activate(&mut self, credentials: &Credentials) -> Result<(), LinkError>;

    /// Ask the interface to (re)associate.  Returns immediately.
    fn request_connect(&mut self) -> Result<(), LinkError>;

    /// Readiness predicate, polled by the link manager.
    fn is_connected(&self) -> bool;
}

/// Connectionless, best-effort datagram egress.
pub trait DatagramPort {
    /// Send one datagram.  Returns the number of bytes handed to the stack.
    fn send_to(&mut self, payload: &[u8], destination: SocketAddrV4)
    -> Result<usize, TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Indicator port (domain → LED)
// ───────────────────────────────────────────────────────────────

/// A single on/off status output.
///
/// Only [`drivers::indicator::play`](crate::drivers::indicator::play)
/// calls this; domain code picks a
/// [`Pattern`](crate::drivers::indicator::Pattern) instead.
pub trait IndicatorPort {
    fn set(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Wall-clock source for record timestamps.
pub trait ClockPort {
    /// Seconds since the Unix epoch.
    fn epoch_secs(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
