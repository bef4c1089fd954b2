//! Outbound application events.
//!
//! [`CycleLoop`](super::service::CycleLoop) and
//! [`LinkManager`](super::link::LinkManager) emit these through the
//! [`EventSink`](super::ports::EventSink) port.  They never change the
//! cycle's behaviour; a sink that drops everything is valid.

use crate::error::Error;
use crate::telemetry::GroupAggregate;

use super::service::LoopPhase;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The top-level loop moved between phases.
    PhaseChanged { from: LoopPhase, to: LoopPhase },

    /// A connect request was issued (1-based attempt number).
    LinkAttempt { attempt: u32 },

    /// The readiness predicate reported connected.
    LinkUp { attempts: u32 },

    /// A bus scan found nothing; the next scan follows after `retry_ms`.
    DiscoveryEmpty { retry_ms: u32 },

    /// A bus scan found devices; the cycle may start.
    DevicesDiscovered { count: usize },

    /// One datagram left the node.
    CycleSent {
        records: usize,
        bytes: usize,
        summary: GroupAggregate,
    },

    /// The cycle was abandoned; nothing was sent.
    CycleFailed {
        error: Error,
        consecutive_failures: u32,
    },
}
