//! Startup discovery: the cycle never begins on an empty bus.

use std::collections::VecDeque;

use pondtemp::app::events::AppEvent;
use pondtemp::app::service::{CycleLoop, LoopPhase};
use pondtemp::config::TelemetryConfig;
use pondtemp::error::BusError;

use crate::mock_hw::*;

#[test]
fn retries_until_a_device_answers() {
    let mut bus = MockBus::with_devices(&[(POND_A, 22.0)]);
    let found = vec![addr(POND_A)];
    bus.scans = VecDeque::from([
        Ok(vec![]),
        Ok(vec![]),
        Err(BusError::CrcMismatch),
        Ok(found.clone()),
    ]);
    let mut cycle = CycleLoop::new(
        TelemetryConfig::default(),
        bus,
        MockAdc::default(),
        FakeClock::starting_at(0),
    );
    let mut delay = RecordingDelay::default();
    let mut sink = RecordingSink::default();

    let count = cycle.discover(&mut delay, &mut sink);

    assert_eq!(count, 1);
    assert_eq!(cycle.devices(), found.as_slice());
    assert_eq!(cycle.bus_mut().discover_calls, 4);
    assert_eq!(cycle.bus_mut().conversions, 0);
    assert_eq!(delay.waits_ms, vec![500, 500, 500]);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::DiscoveryEmpty { retry_ms: 500 })),
        3
    );
    assert_eq!(
        sink.events.last(),
        Some(&AppEvent::DevicesDiscovered { count: 1 })
    );
    assert_eq!(cycle.phase(), LoopPhase::SensorDiscovery);
}

#[test]
fn first_scan_success_does_not_wait() {
    let mut cycle = CycleLoop::new(
        TelemetryConfig::default(),
        MockBus::with_devices(&[(POND_A, 22.0), (POND_B, 23.0)]),
        MockAdc::default(),
        FakeClock::starting_at(0),
    );
    let mut delay = RecordingDelay::default();
    let mut sink = RecordingSink::default();

    assert_eq!(cycle.discover(&mut delay, &mut sink), 2);
    assert!(delay.waits_ms.is_empty());
    assert_eq!(
        sink.events.first(),
        Some(&AppEvent::PhaseChanged {
            from: LoopPhase::Idle,
            to: LoopPhase::SensorDiscovery,
        })
    );
}

#[test]
fn retry_interval_follows_config() {
    let mut bus = MockBus::with_devices(&[(POND_A, 22.0)]);
    bus.scans = VecDeque::from([Ok(vec![]), Ok(vec![addr(POND_A)])]);
    let config = TelemetryConfig {
        discovery_retry_ms: 2_000,
        ..TelemetryConfig::default()
    };
    let mut cycle = CycleLoop::new(config, bus, MockAdc::default(), FakeClock::starting_at(0));
    let mut delay = RecordingDelay::default();

    cycle.discover(&mut delay, &mut RecordingSink::default());
    assert_eq!(delay.waits_ms, vec![2_000]);
}
