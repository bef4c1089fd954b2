//! Cycle loop — the hexagonal core.
//!
//! [`CycleLoop`] owns the bus, the onboard sensor, the clock and the
//! discovered device list for the life of the process.  Everything else
//! (link, socket, LED, delay, event sink) is borrowed per call.
//!
//! ```text
//!  OneWirePort ──▶ ┌────────────────────────┐ ──▶ DatagramPort
//!  AnalogPort  ──▶ │       CycleLoop        │ ──▶ IndicatorPort
//!  ClockPort   ──▶ │ measure · aggregate ·  │ ──▶ EventSink
//!                  │ assemble · encode      │
//!                  └────────────────────────┘
//! ```
//!
//! ## Phases
//!
//! `Idle → LinkConnecting → SensorDiscovery → CycleRunning` (forever).
//!
//! ## Failure policy
//!
//! A cycle either sends exactly one datagram or sends nothing.  Any error
//! in the body abandons the batch, leaves the group extrema as they were
//! before the cycle and is counted in [`CycleStats`].  The next cycle
//! runs on schedule regardless.

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::config::TelemetryConfig;
use crate::drivers::indicator::{self, Pattern};
use crate::error::Error;
use crate::sensors::onboard::OnboardSensor;
use crate::sensors::onewire::DeviceAddress;
use crate::sensors::reading;
use crate::telemetry::batch::{self, TelemetryBatch};
use crate::telemetry::{GroupAggregate, RunningAggregate};

use super::events::AppEvent;
use super::link::{Link, LinkManager};
use super::ports::{
    AnalogPort, ClockPort, DatagramPort, EventSink, IndicatorPort, LinkPort, OneWirePort,
};

// ───────────────────────────────────────────────────────────────
// Phase and per-cycle types
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Idle,
    LinkConnecting,
    SensorDiscovery,
    CycleRunning,
}

/// Counters at the cycle failure boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CycleStats {
    pub cycles_sent: u64,
    pub cycles_failed: u64,
    pub consecutive_failures: u32,
    pub last_error: Option<Error>,
}

impl CycleStats {
    fn record_sent(&mut self) {
        self.cycles_sent += 1;
        self.consecutive_failures = 0;
    }

    fn record_failure(&mut self, error: Error) {
        self.cycles_failed += 1;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_error = Some(error);
    }
}

/// State threaded from one cycle into the next.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CycleState {
    pub aggregate: RunningAggregate,
    pub stats: CycleStats,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Sent {
        records: usize,
        bytes: usize,
        summary: GroupAggregate,
    },
    Failed(Error),
}

impl CycleOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}

struct Sent {
    records: usize,
    bytes: usize,
    summary: GroupAggregate,
}

// ───────────────────────────────────────────────────────────────
// CycleLoop
// ───────────────────────────────────────────────────────────────

pub struct CycleLoop<B, A, C> {
    config: TelemetryConfig,
    bus: B,
    onboard: OnboardSensor<A>,
    clock: C,
    devices: Vec<DeviceAddress>,
    phase: LoopPhase,
}

impl<B, A, C> CycleLoop<B, A, C>
where
    B: OneWirePort,
    A: AnalogPort,
    C: ClockPort,
{
    pub fn new(config: TelemetryConfig, bus: B, adc: A, clock: C) -> Self {
        let onboard = OnboardSensor::new(adc, config.onboard);
        Self {
            config,
            bus,
            onboard,
            clock,
            devices: Vec::new(),
            phase: LoopPhase::Idle,
        }
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    /// Devices found by the last successful [`discover`](Self::discover),
    /// in bus search order.
    pub fn devices(&self) -> &[DeviceAddress] {
        &self.devices
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    fn enter(&mut self, to: LoopPhase, sink: &mut impl EventSink) {
        if self.phase != to {
            let from = self.phase;
            self.phase = to;
            debug!("loop: {:?} -> {:?}", from, to);
            sink.emit(&AppEvent::PhaseChanged { from, to });
        }
    }

    // ── Startup ───────────────────────────────────────────────

    /// Bring the network link up through `manager`, blocking until it is.
    pub fn connect_link<'m, L: LinkPort>(
        &mut self,
        manager: &'m mut LinkManager<L>,
        indicator: &mut impl IndicatorPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) -> &'m Link {
        self.enter(LoopPhase::LinkConnecting, sink);
        manager.connect(&self.config.credentials, indicator, delay, sink)
    }

    /// Scan the bus until at least one device answers.
    ///
    /// An empty scan or a bus error waits `discovery_retry_ms` and scans
    /// again; the cycle never starts on an empty device list.
    pub fn discover(&mut self, delay: &mut impl DelayNs, sink: &mut impl EventSink) -> usize {
        self.enter(LoopPhase::SensorDiscovery, sink);
        let retry_ms = self.config.discovery_retry_ms;
        loop {
            match self.bus.discover() {
                Ok(found) if !found.is_empty() => {
                    info!("loop: {} sensor(s) on the bus", found.len());
                    for address in &found {
                        info!("  {} @ {}", address, self.config.location_of(address));
                    }
                    self.devices = found;
                    sink.emit(&AppEvent::DevicesDiscovered {
                        count: self.devices.len(),
                    });
                    return self.devices.len();
                }
                Ok(_) => debug!("loop: no sensors yet"),
                Err(e) => warn!("loop: discovery failed: {}", e),
            }
            sink.emit(&AppEvent::DiscoveryEmpty { retry_ms });
            delay.delay_ms(retry_ms);
        }
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one acquisition cycle and hand back the next state.
    ///
    /// The indicator goes off at the start and back on only once the
    /// datagram was handed to the transport.
    pub fn run_cycle(
        &mut self,
        state: CycleState,
        link: &Link,
        transport: &mut impl DatagramPort,
        indicator: &mut impl IndicatorPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) -> (CycleState, CycleOutcome) {
        self.enter(LoopPhase::CycleRunning, sink);
        indicator::play(Pattern::CycleBusy, indicator, delay);

        let mut candidate = state.aggregate;
        let mut stats = state.stats;

        match self.cycle_body(&mut candidate, link, transport, delay) {
            Ok(Sent {
                records,
                bytes,
                summary,
            }) => {
                indicator::play(Pattern::CycleDone, indicator, delay);
                stats.record_sent();
                sink.emit(&AppEvent::CycleSent {
                    records,
                    bytes,
                    summary,
                });
                (
                    CycleState {
                        aggregate: candidate,
                        stats,
                    },
                    CycleOutcome::Sent {
                        records,
                        bytes,
                        summary,
                    },
                )
            }
            Err(error) => {
                stats.record_failure(error);
                sink.emit(&AppEvent::CycleFailed {
                    error,
                    consecutive_failures: stats.consecutive_failures,
                });
                (
                    CycleState {
                        aggregate: state.aggregate,
                        stats,
                    },
                    CycleOutcome::Failed(error),
                )
            }
        }
    }

    fn cycle_body(
        &mut self,
        aggregate: &mut RunningAggregate,
        link: &Link,
        transport: &mut impl DatagramPort,
        delay: &mut impl DelayNs,
    ) -> Result<Sent, Error> {
        self.bus.start_conversion()?;
        delay.delay_ms(self.config.conversion_delay_ms);

        let timestamp = self.clock.epoch_secs();
        let measurements = self
            .devices
            .iter()
            .map(|address| reading::measure(&mut self.bus, address, &self.config, timestamp))
            .collect::<Result<Vec<_>, _>>()?;

        let onboard = self.onboard.sample(timestamp)?;

        let group = self.config.group_name.as_str();
        let summary = aggregate.update(&batch::group_values(&measurements, group));

        let batch = TelemetryBatch::assemble(measurements, onboard, group, summary, timestamp);
        let payload = batch.encode()?;
        let destination = self.config.destination();
        let bytes = transport.send_to(&payload, destination)?;
        debug!("loop: {} bytes to {} over {}", bytes, destination, link);

        Ok(Sent {
            records: batch.len(),
            bytes,
            summary,
        })
    }

    /// Cycle forever: one [`run_cycle`](Self::run_cycle), then a fixed
    /// `cycle_period_ms` sleep.
    pub fn run(
        &mut self,
        mut state: CycleState,
        link: &Link,
        transport: &mut impl DatagramPort,
        indicator: &mut impl IndicatorPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) -> ! {
        info!(
            "loop: cycling every {} ms, group '{}'",
            self.config.cycle_period_ms, self.config.group_name
        );
        loop {
            let (next, _outcome) = self.run_cycle(state, link, transport, indicator, delay, sink);
            state = next;
            delay.delay_ms(self.config.cycle_period_ms);
        }
    }
}
