//! Status indicator patterns and the single place that drives the LED.
//!
//! Deciding *what* to show is pure: a [`Pattern`] maps to a fixed list of
//! [`Step`]s.  [`play`] is the only code that touches an
//! [`IndicatorPort`], so the link manager and cycle loop stay testable
//! against a recording mock.
//!
//! | Pattern        | Shape                                   | Meaning              |
//! |----------------|-----------------------------------------|----------------------|
//! | `LinkStarting` | 10 × (off 5 ms, on)                     | first connect        |
//! | `LinkRetrying` | 20 × (off 20 ms, on)                    | still waiting        |
//! | `CycleBusy`    | off                                     | cycle in progress    |
//! | `CycleDone`    | on                                      | datagram sent        |

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::IndicatorPort;

/// One output level held for `hold_ms` before the next step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub on: bool,
    pub hold_ms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    LinkStarting,
    LinkRetrying,
    CycleBusy,
    CycleDone,
}

/// `N / 2` short off-pulses, each followed by switching back on.
const fn pulses<const N: usize>(off_ms: u32) -> [Step; N] {
    let mut steps = [Step { on: true, hold_ms: 0 }; N];
    let mut i = 0;
    while i < N {
        steps[i] = Step { on: false, hold_ms: off_ms };
        i += 2;
    }
    steps
}

static LINK_STARTING: [Step; 20] = pulses::<20>(5);
static LINK_RETRYING: [Step; 40] = pulses::<40>(20);
static CYCLE_BUSY: [Step; 1] = [Step { on: false, hold_ms: 0 }];
static CYCLE_DONE: [Step; 1] = [Step { on: true, hold_ms: 0 }];

impl Pattern {
    pub fn steps(self) -> &'static [Step] {
        match self {
            Self::LinkStarting => &LINK_STARTING,
            Self::LinkRetrying => &LINK_RETRYING,
            Self::CycleBusy => &CYCLE_BUSY,
            Self::CycleDone => &CYCLE_DONE,
        }
    }

    /// Total time the pattern blocks for.
    pub fn duration_ms(self) -> u32 {
        self.steps().iter().map(|s| s.hold_ms).sum()
    }
}

/// Drive `indicator` through `pattern`, blocking for its duration.
pub fn play(pattern: Pattern, indicator: &mut impl IndicatorPort, delay: &mut impl DelayNs) {
    for step in pattern.steps() {
        indicator.set(step.on);
        if step.hold_ms > 0 {
            delay.delay_ms(step.hold_ms);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// GPIO-backed indicator
// ───────────────────────────────────────────────────────────────

/// Single discrete status LED on any `embedded-hal` output pin.
pub struct StatusLed<P> {
    pin: P,
    lit: bool,
}

impl<P: OutputPin> StatusLed<P> {
    pub fn new(pin: P) -> Self {
        Self { pin, lit: false }
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}

impl<P: OutputPin> IndicatorPort for StatusLed<P> {
    fn set(&mut self, on: bool) {
        let res = if on { self.pin.set_high() } else { self.pin.set_low() };
        match res {
            Ok(()) => self.lit = on,
            Err(_) => warn!("indicator: failed to drive status LED"),
        }
    }
}
