//! PondTemp Firmware — Main Entry Point
//!
//! Wires the ESP-IDF peripherals into the hexagonal core and hands
//! control to the cycle loop, which never returns.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  BitBangLink+Ds18x20Bus  EspAdc        SystemClock  LogEventSink│
//! │  (OneWirePort)           (AnalogPort)  (ClockPort)  (EventSink)│
//! │  EspWifiLink  UdpTransport   StatusLed                          │
//! │  (LinkPort)   (DatagramPort) (IndicatorPort)                    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │   LinkManager → CycleLoop (measure · aggregate · send) │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Result, anyhow};
use log::{info, warn};

use esp_idf_hal::adc::attenuation::DB_11;
use esp_idf_hal::adc::oneshot::config::AdcChannelConfig;
use esp_idf_hal::adc::oneshot::{AdcChannelDriver, AdcDriver};
use esp_idf_hal::delay::{Ets, FreeRtos};
use esp_idf_hal::gpio::{AnyIOPin, PinDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sntp::{EspSntp, SyncStatus};
use esp_idf_svc::wifi::EspWifi;

use pondtemp::adapters::adc::EspAdc;
use pondtemp::adapters::clock::SystemClock;
use pondtemp::adapters::log_sink::LogEventSink;
use pondtemp::adapters::udp::UdpTransport;
use pondtemp::adapters::wifi::EspWifiLink;
use pondtemp::app::link::LinkManager;
use pondtemp::app::service::{CycleLoop, CycleState};
use pondtemp::config::{Credentials, TelemetryConfig};
use pondtemp::drivers::StatusLed;
use pondtemp::pins;
use pondtemp::sensors::onewire::InterruptsMasked;
use pondtemp::sensors::{BitBangLink, Ds18x20Bus};

// The typed peripherals claimed below must match the pin table.
const _: () = assert!(pins::STATUS_LED_GPIO == 2 && pins::ONBOARD_ADC_GPIO == 4);

/// SNTP sync is awaited for at most this many 500 ms polls.
const SNTP_WAIT_POLLS: u32 = 20;

/// Defaults overlaid with credentials baked in at build time.
fn build_config() -> Result<TelemetryConfig> {
    let mut config = TelemetryConfig::default();
    if let (Some(ssid), Some(password)) = (
        option_env!("POND_WIFI_SSID"),
        option_env!("POND_WIFI_PASSWORD"),
    ) {
        config.credentials =
            Credentials::new(ssid, password).map_err(|e| anyhow!("credentials: {}", e))?;
    } else {
        warn!("POND_WIFI_SSID / POND_WIFI_PASSWORD not set at build time, using placeholders");
    }
    config.validate().map_err(|e| anyhow!("config: {}", e))?;
    Ok(config)
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  PondTemp v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = build_config()?;
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    let mut delay = FreeRtos;
    let mut sink = LogEventSink::new();
    let mut led = StatusLed::new(PinDriver::output(peripherals.pins.gpio2)?);

    // ── 2. Sensors ────────────────────────────────────────────
    // SAFETY: `validate()` rejected negative numbers and the LED / ADC
    // pins, so no other driver owns this GPIO.
    let bus_pin = PinDriver::input_output_od(unsafe { AnyIOPin::new(config.bus_gpio) })?;
    let link = BitBangLink::with_guard(bus_pin, Ets, InterruptsMasked)
        .map_err(|e| anyhow!("one-wire: {}", e))?;
    let bus = Ds18x20Bus::new(link);
    info!("One-wire bus on GPIO{}", config.bus_gpio);

    let adc = AdcDriver::new(peripherals.adc1)?;
    let channel = AdcChannelDriver::new(
        &adc,
        peripherals.pins.gpio4,
        &AdcChannelConfig {
            attenuation: DB_11,
            ..Default::default()
        },
    )?;
    let onboard = EspAdc::new(channel);

    let clock = SystemClock::new();
    let mut cycle = CycleLoop::new(config, bus, onboard, clock);

    // ── 3. Network link (blocks until up) ─────────────────────
    let wifi = EspWifi::new(peripherals.modem, sysloop, Some(nvs))?;
    let mut links = LinkManager::new(EspWifiLink::new(wifi), cycle.config().link);
    let link = cycle.connect_link(&mut links, &mut led, &mut delay, &mut sink);
    info!("{}", link);

    // ── 4. Wall clock ─────────────────────────────────────────
    let sntp = EspSntp::new_default()?;
    for _ in 0..SNTP_WAIT_POLLS {
        if sntp.get_sync_status() == SyncStatus::Completed {
            break;
        }
        FreeRtos::delay_ms(500);
    }
    if clock.is_synced() {
        info!("SNTP: clock synced");
    } else {
        warn!("SNTP: not synced yet, early timestamps will be near 1970");
    }

    // ── 5. Transport ──────────────────────────────────────────
    let mut transport = UdpTransport::bind().map_err(|e| anyhow!("udp: {}", e))?;
    info!("Broadcasting to {}", cycle.config().destination());

    // ── 6. Discovery, then cycle forever ──────────────────────
    cycle.discover(&mut delay, &mut sink);
    cycle.run(
        CycleState::default(),
        link,
        &mut transport,
        &mut led,
        &mut delay,
        &mut sink,
    )
}
