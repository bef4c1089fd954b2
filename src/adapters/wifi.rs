//! WiFi station-mode adapters.
//!
//! Implement [`LinkPort`], the hexagonal boundary that
//! [`LinkManager`](crate::app::link::LinkManager) drives.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: [`EspWifiLink`] over `esp_idf_svc::wifi::EspWifi`.
//! - **all other targets**: [`SimLink`], a deterministic simulation for
//!   host-side tests.
//!
//! Neither adapter reconnects on its own.  The readiness predicate is
//! "associated *and* the station netif has an address", since a datagram
//! cannot leave before DHCP completes.

#[cfg(not(target_os = "espidf"))]
use core::cell::Cell;

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::LinkPort;
use crate::config::Credentials;
use crate::error::LinkError;

// ───────────────────────────────────────────────────────────────
// ESP-IDF adapter
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct EspWifiLink {
    wifi: esp_idf_svc::wifi::EspWifi<'static>,
}

#[cfg(target_os = "espidf")]
impl EspWifiLink {
    pub fn new(wifi: esp_idf_svc::wifi::EspWifi<'static>) -> Self {
        Self { wifi }
    }
}

#[cfg(target_os = "espidf")]
impl LinkPort for EspWifiLink {
    fn activate(&mut self, credentials: &Credentials) -> Result<(), LinkError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        credentials
            .validate()
            .map_err(|_| LinkError::ActivationFailed)?;

        let auth_method = if credentials.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let config = Configuration::Client(ClientConfiguration {
            ssid: credentials
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| LinkError::ActivationFailed)?,
            password: credentials
                .password
                .as_str()
                .try_into()
                .map_err(|_| LinkError::ActivationFailed)?,
            auth_method,
            ..Default::default()
        });

        self.wifi.set_configuration(&config).map_err(|e| {
            warn!("WiFi: set_configuration failed: {}", e);
            LinkError::ActivationFailed
        })?;
        self.wifi.start().map_err(|e| {
            warn!("WiFi: start failed: {}", e);
            LinkError::ActivationFailed
        })?;
        info!("WiFi: STA started");
        Ok(())
    }

    fn request_connect(&mut self) -> Result<(), LinkError> {
        self.wifi.connect().map_err(|e| {
            warn!("WiFi: connect request failed: {}", e);
            LinkError::ConnectRequestFailed
        })
    }

    fn is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false) && self.wifi.sta_netif().is_up().unwrap_or(false)
    }
}

// ───────────────────────────────────────────────────────────────
// Host simulation
// ───────────────────────────────────────────────────────────────

/// Simulated interface that reports connected after a fixed number of
/// unsuccessful readiness polls, with optional injected failures.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
pub struct SimLink {
    up_after_polls: u32,
    activation_failures: u32,
    request_failures: u32,
    activated: bool,
    activations: u32,
    connect_requests: u32,
    polls: Cell<u32>,
}

#[cfg(not(target_os = "espidf"))]
impl SimLink {
    /// Link that answers `false` to the first `up_after_polls` polls made
    /// after activation and a connect request, then `true` forever.
    pub fn new(up_after_polls: u32) -> Self {
        Self {
            up_after_polls,
            ..Self::default()
        }
    }

    /// Fail the next `n` activations.
    #[must_use]
    pub fn failing_activations(mut self, n: u32) -> Self {
        self.activation_failures = n;
        self
    }

    /// Fail the next `n` connect requests.
    #[must_use]
    pub fn failing_requests(mut self, n: u32) -> Self {
        self.request_failures = n;
        self
    }

    pub fn activations(&self) -> u32 {
        self.activations
    }

    pub fn connect_requests(&self) -> u32 {
        self.connect_requests
    }

    /// Readiness polls counted towards coming up.
    pub fn polls(&self) -> u32 {
        self.polls.get()
    }
}

#[cfg(not(target_os = "espidf"))]
impl LinkPort for SimLink {
    fn activate(&mut self, credentials: &Credentials) -> Result<(), LinkError> {
        if self.activation_failures > 0 {
            self.activation_failures -= 1;
            return Err(LinkError::ActivationFailed);
        }
        credentials
            .validate()
            .map_err(|_| LinkError::ActivationFailed)?;
        self.activated = true;
        self.activations += 1;
        info!("WiFi(sim): STA started for '{}'", credentials.ssid);
        Ok(())
    }

    fn request_connect(&mut self) -> Result<(), LinkError> {
        if !self.activated {
            return Err(LinkError::ConnectRequestFailed);
        }
        if self.request_failures > 0 {
            self.request_failures -= 1;
            return Err(LinkError::ConnectRequestFailed);
        }
        self.connect_requests += 1;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        if !self.activated || self.connect_requests == 0 {
            return false;
        }
        let n = self.polls.get() + 1;
        self.polls.set(n);
        n > self.up_after_polls
    }
}
