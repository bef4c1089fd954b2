//! Network link bring-up: connect-with-retry, never fails to the caller.
//!
//! ```text
//!  Idle ──▶ Activating ──▶ Connecting{n} ──poll✗──▶ Waiting{n, polls}
//!                               ▲                        │
//!                               └──── reissue_after ─────┤
//!                                                        │ poll✓
//!                                         Connected ◀────┘
//! ```
//!
//! [`LinkState::on_poll`] is the pure transition function; [`LinkManager`]
//! performs the side effects around it (radio calls, indicator patterns,
//! waits).  Once connected the link is never torn down or re-established:
//! a later drop surfaces only as failed cycles.

use core::fmt;

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::config::{Credentials, LinkTiming};
use crate::drivers::indicator::{self, Pattern};

use super::events::AppEvent;
use super::ports::{EventSink, IndicatorPort, LinkPort};

// ───────────────────────────────────────────────────────────────
// State machine
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Activating,
    /// A connect request (1-based `attempt`) was just issued.
    Connecting { attempt: u32 },
    /// `polls` unsuccessful readiness polls since request `attempt`.
    Waiting { attempt: u32, polls: u32 },
    Connected,
}

/// What the manager should do after a readiness poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    Done,
    Wait,
    Reissue,
}

impl LinkState {
    /// Fold one readiness poll into the state.
    ///
    /// After `reissue_after` unsuccessful polls on the same request the
    /// state moves to the next attempt and asks for a new request.
    pub fn on_poll(&mut self, connected: bool, reissue_after: u32) -> LinkAction {
        if connected {
            *self = Self::Connected;
            return LinkAction::Done;
        }
        let (attempt, polls) = match *self {
            Self::Connected => return LinkAction::Done,
            Self::Idle | Self::Activating => return LinkAction::Wait,
            Self::Connecting { attempt } => (attempt, 1),
            Self::Waiting { attempt, polls } => (attempt, polls + 1),
        };
        if polls >= reissue_after {
            *self = Self::Connecting {
                attempt: attempt + 1,
            };
            LinkAction::Reissue
        } else {
            *self = Self::Waiting { attempt, polls };
            LinkAction::Wait
        }
    }

    /// Current 1-based request number, `0` before the first request.
    pub fn attempt(&self) -> u32 {
        match *self {
            Self::Connecting { attempt } | Self::Waiting { attempt, .. } => attempt,
            Self::Idle | Self::Activating | Self::Connected => 0,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Link handle
// ───────────────────────────────────────────────────────────────

/// Proof that the interface came up.  Owned by the [`LinkManager`];
/// the cycle loop only ever borrows it.
#[derive(Debug, PartialEq, Eq)]
pub struct Link {
    attempts: u32,
    polls: u32,
}

impl Link {
    /// Connect requests issued before the link came up.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Readiness polls it took in total.
    pub fn polls(&self) -> u32 {
        self.polls
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link(up after {} request(s), {} poll(s))", self.attempts, self.polls)
    }
}

// ───────────────────────────────────────────────────────────────
// Manager
// ───────────────────────────────────────────────────────────────

pub struct LinkManager<L> {
    port: L,
    timing: LinkTiming,
    state: LinkState,
    link: Option<Link>,
}

impl<L: LinkPort> LinkManager<L> {
    pub fn new(port: L, timing: LinkTiming) -> Self {
        Self {
            port,
            timing,
            state: LinkState::Idle,
            link: None,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn link(&self) -> Option<&Link> {
        self.link.as_ref()
    }

    pub fn port(&self) -> &L {
        &self.port
    }

    /// Block until the interface reports connected.
    ///
    /// Plays [`Pattern::LinkStarting`] once, then [`Pattern::LinkRetrying`]
    /// before every wait.  Activation or request errors are logged and
    /// treated like an unsuccessful poll; activation is retried together
    /// with the next connect request.  Returns immediately if the link is
    /// already up.
    pub fn connect(
        &mut self,
        credentials: &Credentials,
        indicator: &mut impl IndicatorPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) -> &Link {
        let existing = self.link.as_ref().map(|l| (l.attempts, l.polls));
        let (attempts, polls) = match existing {
            Some(done) => done,
            None => self.establish(credentials, indicator, delay, sink),
        };
        self.link.insert(Link { attempts, polls })
    }

    fn establish(
        &mut self,
        credentials: &Credentials,
        indicator: &mut impl IndicatorPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) -> (u32, u32) {
        info!("link: connecting to '{}'", credentials.ssid);
        indicator::play(Pattern::LinkStarting, indicator, delay);
        delay.delay_ms(self.timing.startup_settle_ms);

        self.state = LinkState::Activating;
        let mut activated = self.try_activate(credentials);
        delay.delay_ms(self.timing.activate_settle_ms);

        self.state = LinkState::Connecting { attempt: 1 };
        self.request(1, sink);

        let mut attempt = 1u32;
        let mut polls = 0u32;
        loop {
            polls += 1;
            let connected = self.port.is_connected();
            match self.state.on_poll(connected, self.timing.reissue_after_polls) {
                LinkAction::Done => break,
                LinkAction::Wait => {}
                LinkAction::Reissue => {
                    attempt = self.state.attempt();
                    warn!("link: not up after {} polls, re-issuing connect", polls);
                    if !activated {
                        activated = self.try_activate(credentials);
                    }
                    self.request(attempt, sink);
                }
            }
            indicator::play(Pattern::LinkRetrying, indicator, delay);
            delay.delay_ms(self.timing.poll_interval_ms);
        }

        info!("link: connected after {} request(s)", attempt);
        sink.emit(&AppEvent::LinkUp { attempts: attempt });
        (attempt, polls)
    }

    fn try_activate(&mut self, credentials: &Credentials) -> bool {
        match self.port.activate(credentials) {
            Ok(()) => true,
            Err(e) => {
                warn!("link: {}", e);
                false
            }
        }
    }

    fn request(&mut self, attempt: u32, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::LinkAttempt { attempt });
        if let Err(e) = self.port.request_connect() {
            warn!("link: {}", e);
        }
    }
}
