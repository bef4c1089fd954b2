//! Full cycles over the bit-level one-wire simulation: ROM search,
//! conversion, scratchpad CRC and decoding all run for real.

use pondtemp::adapters::sim_onewire::{SimDevice, SimOneWireNetwork};
use pondtemp::adapters::wifi::SimLink;
use pondtemp::app::link::LinkManager;
use pondtemp::app::service::{CycleLoop, CycleOutcome, CycleState};
use pondtemp::config::TelemetryConfig;
use pondtemp::error::{BusError, Error};
use pondtemp::sensors::Ds18x20Bus;
use pondtemp::telemetry::{Measurement, Record};

use crate::mock_hw::*;

type SimLoop = CycleLoop<Ds18x20Bus<SimOneWireNetwork>, MockAdc, FakeClock>;

fn pond_network() -> SimOneWireNetwork {
    SimOneWireNetwork::new(vec![
        SimDevice::new(addr(PUMP_HOUSING), 30.0625),
        SimDevice::new(addr(POND_A), 21.5),
        SimDevice::new(addr(POND_B), 25.0625).with_config(0x1F),
    ])
}

fn sim_loop(network: SimOneWireNetwork) -> SimLoop {
    CycleLoop::new(
        TelemetryConfig::default(),
        Ds18x20Bus::new(network),
        MockAdc::default(),
        FakeClock::starting_at(1_700_000_000),
    )
}

fn measurements(transport: &MockTransport) -> Vec<Measurement> {
    transport
        .last_batch()
        .records()
        .iter()
        .filter_map(|r| match r {
            Record::Measurement(m) => Some(m.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn search_finds_every_placed_sensor() {
    let mut cycle = sim_loop(pond_network());
    let count = cycle.discover(&mut RecordingDelay::default(), &mut RecordingSink::default());

    assert_eq!(count, 3);
    let mut found = cycle.devices().to_vec();
    found.sort();
    let mut expected = vec![addr(PUMP_HOUSING), addr(POND_A), addr(POND_B)];
    expected.sort();
    assert_eq!(found, expected);
}

#[test]
fn cycle_decodes_real_scratchpads() {
    let config = TelemetryConfig::default();
    let mut links = LinkManager::new(SimLink::new(0), config.link);
    let link = links.connect(
        &config.credentials,
        &mut MockIndicator::default(),
        &mut RecordingDelay::default(),
        &mut RecordingSink::default(),
    );

    let mut cycle = sim_loop(pond_network());
    let mut delay = RecordingDelay::default();
    let mut sink = RecordingSink::default();
    let mut transport = MockTransport::default();
    cycle.discover(&mut delay, &mut sink);

    let (_, outcome) = cycle.run_cycle(
        CycleState::default(),
        link,
        &mut transport,
        &mut MockIndicator::default(),
        &mut delay,
        &mut sink,
    );
    let CycleOutcome::Sent { summary, .. } = outcome else {
        panic!("cycle failed: {:?}", outcome);
    };

    let by_addr = |hex: &str| {
        measurements(&transport)
            .into_iter()
            .find(|m| m.sensor == addr(hex))
            .expect("sensor missing from batch")
    };

    let pump = by_addr(PUMP_HOUSING);
    assert_eq!(pump.value, 30.0625);
    assert_eq!(pump.location, "Pump housing");
    assert!(pump.alarm);

    let a = by_addr(POND_A);
    assert_eq!(a.value, 21.5);
    assert!(!a.alarm);
    assert_eq!((a.resolution_raw, a.resolution_bits), (3, 36));

    // 9-bit device drops the 1/16 fraction and sits exactly on the high bound.
    let b = by_addr(POND_B);
    assert_eq!(b.value, 25.0);
    assert!(!b.alarm);
    assert_eq!((b.resolution_raw, b.resolution_bits), (0, 9));

    assert_eq!(summary.average, 23.25);
}

#[test]
fn corrupted_scratchpad_fails_the_cycle() {
    let config = TelemetryConfig::default();
    let mut links = LinkManager::new(SimLink::new(0), config.link);
    let link = links.connect(
        &config.credentials,
        &mut MockIndicator::default(),
        &mut RecordingDelay::default(),
        &mut RecordingSink::default(),
    );

    let mut cycle = sim_loop(pond_network());
    let mut delay = RecordingDelay::default();
    let mut sink = RecordingSink::default();
    let mut transport = MockTransport::default();
    cycle.discover(&mut delay, &mut sink);
    cycle.bus_mut().link_mut().corrupt_reads(&addr(POND_A), true);

    let (state, outcome) = cycle.run_cycle(
        CycleState::default(),
        link,
        &mut transport,
        &mut MockIndicator::default(),
        &mut delay,
        &mut sink,
    );

    assert_eq!(outcome, CycleOutcome::Failed(Error::Bus(BusError::CrcMismatch)));
    assert!(transport.sent.is_empty());
    assert!(!state.aggregate.is_seeded());
}
