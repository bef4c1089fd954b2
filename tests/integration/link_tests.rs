//! Link manager against the simulated WiFi interface.

use pondtemp::adapters::wifi::SimLink;
use pondtemp::app::events::AppEvent;
use pondtemp::app::link::{LinkManager, LinkState};
use pondtemp::config::{Credentials, LinkTiming};

use crate::mock_hw::*;

struct Rig {
    led: MockIndicator,
    delay: RecordingDelay,
    sink: RecordingSink,
}

fn creds() -> Credentials {
    Credentials::new("PondNet", "pond-secret").unwrap()
}

fn connect(sim: SimLink) -> (LinkManager<SimLink>, Rig, u32, u32) {
    let mut manager = LinkManager::new(sim, LinkTiming::default());
    let mut rig = Rig {
        led: MockIndicator::default(),
        delay: RecordingDelay::default(),
        sink: RecordingSink::default(),
    };
    let link = manager.connect(&creds(), &mut rig.led, &mut rig.delay, &mut rig.sink);
    let (attempts, polls) = (link.attempts(), link.polls());
    (manager, rig, attempts, polls)
}

#[test]
fn immediate_link_settles_then_connects() {
    let (manager, rig, attempts, polls) = connect(SimLink::new(0));

    assert_eq!((attempts, polls), (1, 1));
    assert_eq!(manager.state(), LinkState::Connected);
    assert_eq!(rig.delay.count_of(3_000), 1);
    assert_eq!(rig.delay.count_of(2_000), 1);
    assert_eq!(rig.delay.count_of(5_000), 0);
    assert_eq!(rig.led.off_pulses(), 10);
    assert_eq!(rig.led.is_on(), Some(true));
    assert_eq!(
        rig.sink.events,
        vec![
            AppEvent::LinkAttempt { attempt: 1 },
            AppEvent::LinkUp { attempts: 1 },
        ]
    );
}

#[test]
fn each_unsuccessful_poll_blinks_and_waits() {
    let (_, rig, attempts, polls) = connect(SimLink::new(3));

    assert_eq!((attempts, polls), (1, 4));
    assert_eq!(rig.delay.count_of(5_000), 3);
    assert_eq!(rig.led.off_pulses(), 10 + 3 * 20);
    assert_eq!(rig.delay.count_of(20), 3 * 20);
}

#[test]
fn reissues_connect_after_six_polls() {
    let (manager, rig, attempts, polls) = connect(SimLink::new(7));

    assert_eq!((attempts, polls), (2, 8));
    assert_eq!(manager.port().connect_requests(), 2);
    assert_eq!(manager.port().activations(), 1);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::LinkAttempt { .. })),
        2
    );
    assert_eq!(rig.sink.events.last(), Some(&AppEvent::LinkUp { attempts: 2 }));
}

#[test]
fn failed_activation_is_retried_with_the_next_request() {
    let (manager, rig, attempts, polls) = connect(SimLink::new(0).failing_activations(1));

    assert_eq!((attempts, polls), (2, 7));
    assert_eq!(manager.port().activations(), 1);
    assert_eq!(manager.port().connect_requests(), 1);
    assert_eq!(manager.port().polls(), 1);
    assert_eq!(rig.delay.count_of(5_000), 6);
}

#[test]
fn failed_request_counts_as_unsuccessful_poll() {
    let (manager, _, attempts, polls) = connect(SimLink::new(0).failing_requests(1));

    assert_eq!((attempts, polls), (2, 7));
    assert_eq!(manager.port().connect_requests(), 1);
}

#[test]
fn reissue_interval_follows_timing() {
    let timing = LinkTiming {
        reissue_after_polls: 2,
        ..LinkTiming::default()
    };
    let mut manager = LinkManager::new(SimLink::new(4), timing);
    let mut sink = RecordingSink::default();
    let link = manager.connect(
        &creds(),
        &mut MockIndicator::default(),
        &mut RecordingDelay::default(),
        &mut sink,
    );
    // Polls 2 and 4 re-issue; poll 5 is the first past the threshold.
    assert_eq!((link.attempts(), link.polls()), (3, 5));
    assert_eq!(sink.count(|e| matches!(e, AppEvent::LinkAttempt { .. })), 3);
}

#[test]
fn second_connect_returns_the_established_link() {
    let (mut manager, mut rig, attempts, polls) = connect(SimLink::new(2));
    let events_before = rig.sink.events.len();
    let waits_before = rig.delay.waits_ms.len();

    let link = manager.connect(&creds(), &mut rig.led, &mut rig.delay, &mut rig.sink);

    assert_eq!((link.attempts(), link.polls()), (attempts, polls));
    assert_eq!(rig.sink.events.len(), events_before);
    assert_eq!(rig.delay.waits_ms.len(), waits_before);
    assert_eq!(manager.port().connect_requests(), 1);
}
