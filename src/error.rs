//! Unified error types for the PondTemp firmware.
//!
//! Every subsystem has its own small `Copy` enum; all of them convert into
//! the top-level [`Error`] so the cycle loop can treat a failed cycle as one
//! coarse fault and still record *why* it failed.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The one-wire bus or a device on it misbehaved.
    Bus(BusError),
    /// The onboard analog sensor could not be sampled.
    Sensor(SensorError),
    /// The telemetry batch could not be encoded.
    Encode,
    /// The datagram could not be handed to the network stack.
    Transport(TransportError),
    /// The network link could not be brought up.
    Link(LinkError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Encode => write!(f, "encode: telemetry serialisation failed"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// One-wire bus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// No device answered the reset pulse.
    NoPresence,
    /// A ROM code or scratchpad failed its CRC-8 check.
    CrcMismatch,
    /// The GPIO backing the bus returned an error.
    Pin,
    /// The addressed device family has no temperature decoder.
    UnsupportedFamily(u8),
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPresence => write!(f, "no presence pulse"),
            Self::CrcMismatch => write!(f, "CRC mismatch"),
            Self::Pin => write!(f, "bus GPIO error"),
            Self::UnsupportedFamily(code) => write!(f, "unsupported device family 0x{code:02x}"),
        }
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

// ---------------------------------------------------------------------------
// Analog sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC read returned an error or timed out.
    AdcReadFailed,
    /// Calibration constants make the conversion undefined (zero range).
    InvalidCalibration,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::InvalidCalibration => write!(f, "invalid calibration"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Datagram transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The socket could not be opened or configured.
    SocketSetup,
    /// The network stack refused the datagram.
    SendFailed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SocketSetup => write!(f, "socket setup failed"),
            Self::SendFailed => write!(f, "datagram send failed"),
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Network link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// The interface could not be configured or started.
    ActivationFailed,
    /// The association request was rejected by the driver.
    ConnectRequestFailed,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ActivationFailed => write!(f, "interface activation failed"),
            Self::ConnectRequestFailed => write!(f, "connect request failed"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
