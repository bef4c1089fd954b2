//! System configuration parameters
//!
//! Everything the firmware needs to know about its deployment lives in one
//! immutable [`TelemetryConfig`] handed to the components at construction.
//! `Default` is the reference pond deployment; a surrounding loader may
//! supply a JSON document instead via [`TelemetryConfig::from_json`].

use core::fmt;
use std::collections::BTreeMap;
use std::net::{Ipv4Addr, SocketAddrV4};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::pins;
use crate::sensors::ds18x20::CONVERSION_DELAY_MS;
use crate::sensors::onboard::OnboardCalibration;
use crate::sensors::onewire::DeviceAddress;
use crate::sensors::reading::{AlarmThresholds, LOCATION_UNPLACED};

// ───────────────────────────────────────────────────────────────
// Errors
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The document could not be parsed.
    Corrupted,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Corrupted => Self::Config("corrupted"),
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Credentials
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// WiFi station credentials (WPA2 personal or open).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub ssid: heapless::String<32>,
    pub password: heapless::String<64>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(ssid: &str, password: &str) -> Result<Self, ConfigError> {
        let creds = Self {
            ssid: heapless::String::try_from(ssid)
                .map_err(|_| ConfigError::ValidationFailed("ssid longer than 32 bytes"))?,
            password: heapless::String::try_from(password)
                .map_err(|_| ConfigError::ValidationFailed("password longer than 64 bytes"))?,
        };
        creds.validate()?;
        Ok(creds)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ssid.is_empty() || !is_printable_ascii(&self.ssid) {
            return Err(ConfigError::ValidationFailed(
                "ssid must be 1-32 printable ASCII bytes",
            ));
        }
        if !self.password.is_empty() && self.password.len() < 8 {
            return Err(ConfigError::ValidationFailed(
                "password must be empty (open) or 8-64 bytes",
            ));
        }
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Link timing
// ───────────────────────────────────────────────────────────────

/// Waits used while bringing the network link up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTiming {
    /// Pause after the start pattern, before touching the radio.
    pub startup_settle_ms: u32,
    /// Pause between activating the interface and the first connect request.
    pub activate_settle_ms: u32,
    /// Interval between readiness polls.
    pub poll_interval_ms: u32,
    /// Unsuccessful polls after which the connect request is re-issued.
    pub reissue_after_polls: u32,
}

impl Default for LinkTiming {
    fn default() -> Self {
        Self {
            startup_settle_ms: 3_000,
            activate_settle_ms: 2_000,
            poll_interval_ms: 5_000,
            reissue_after_polls: 6,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Telemetry configuration
// ───────────────────────────────────────────────────────────────

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    // --- Network ---
    pub credentials: Credentials,
    /// Broadcast destination, IPv4 octets.
    pub destination_ip: [u8; 4],
    pub destination_port: u16,
    pub link: LinkTiming,

    // --- Bus ---
    /// GPIO carrying the one-wire data line.
    pub bus_gpio: i32,
    /// Settle time between CONVERT T and reading the scratchpads (ms).
    pub conversion_delay_ms: u32,
    /// Pause between empty bus searches at startup (ms).
    pub discovery_retry_ms: u32,

    // --- Classification ---
    pub alarm: AlarmThresholds,
    /// Device address → human-readable location.
    pub placements: BTreeMap<DeviceAddress, String>,
    /// Location whose sensors are averaged into the group records.
    pub group_name: String,

    // --- Onboard sensor ---
    pub onboard: OnboardCalibration,

    // --- Timing ---
    /// Sleep between cycles (ms).
    pub cycle_period_ms: u32,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        let placements = [
            ("28fd93df0d000054", "Pump housing"),
            ("2825d05704e13c71", "Pond"),
            ("287e9d5704e13ca2", "Pond"),
        ]
        .into_iter()
        .filter_map(|(hex, loc)| Some((hex.parse().ok()?, loc.to_string())))
        .collect();

        Self {
            credentials: Credentials {
                ssid: heapless::String::try_from("pond-telemetry").unwrap_or_default(),
                password: heapless::String::try_from("change-me-please").unwrap_or_default(),
            },
            destination_ip: [10, 81, 1, 255],
            destination_port: 5007,
            link: LinkTiming::default(),

            bus_gpio: pins::ONEWIRE_GPIO,
            conversion_delay_ms: CONVERSION_DELAY_MS,
            discovery_retry_ms: 500,

            alarm: AlarmThresholds::default(),
            placements,
            group_name: "Pond".into(),

            onboard: OnboardCalibration::default(),

            cycle_period_ms: 1_000,
        }
    }
}

impl TelemetryConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(doc: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(doc).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject out-of-range values.  Nothing is clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.credentials.validate()?;
        if self.destination_port == 0 {
            return Err(ConfigError::ValidationFailed("destination_port must be non-zero"));
        }
        if !(self.alarm.low_c.is_finite() && self.alarm.high_c.is_finite()) {
            return Err(ConfigError::ValidationFailed("alarm thresholds must be finite"));
        }
        if self.alarm.low_c >= self.alarm.high_c {
            return Err(ConfigError::ValidationFailed("alarm.low_c must be below alarm.high_c"));
        }
        if self.group_name.is_empty() {
            return Err(ConfigError::ValidationFailed("group_name must not be empty"));
        }
        if self.onboard.bit_range == 0 {
            return Err(ConfigError::ValidationFailed("onboard.bit_range must be non-zero"));
        }
        if self.onboard.slope_v_per_c == 0.0 || !self.onboard.slope_v_per_c.is_finite() {
            return Err(ConfigError::ValidationFailed("onboard.slope_v_per_c must be non-zero"));
        }
        if self.cycle_period_ms == 0 {
            return Err(ConfigError::ValidationFailed("cycle_period_ms must be non-zero"));
        }
        if self.conversion_delay_ms == 0 {
            return Err(ConfigError::ValidationFailed("conversion_delay_ms must be non-zero"));
        }
        if self.bus_gpio < 0 {
            return Err(ConfigError::ValidationFailed("bus_gpio must be non-negative"));
        }
        if self.bus_gpio == pins::STATUS_LED_GPIO || self.bus_gpio == pins::ONBOARD_ADC_GPIO {
            return Err(ConfigError::ValidationFailed(
                "bus_gpio is already claimed by the status LED or the onboard ADC",
            ));
        }
        if self.link.poll_interval_ms == 0 || self.link.reissue_after_polls == 0 {
            return Err(ConfigError::ValidationFailed(
                "link poll interval and reissue count must be non-zero",
            ));
        }
        Ok(())
    }

    pub fn destination(&self) -> SocketAddrV4 {
        SocketAddrV4::new(Ipv4Addr::from(self.destination_ip), self.destination_port)
    }

    /// Placement of a device, `"None"` when the table has no entry.
    pub fn location_of(&self, address: &DeviceAddress) -> &str {
        self.placements
            .get(address)
            .map_or(LOCATION_UNPLACED, String::as_str)
    }
}
