//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (ESP-IDF console in production, whatever `log` backend the
//! host installs otherwise).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::PhaseChanged { from, to } => {
                info!("PHASE | {:?} -> {:?}", from, to);
            }
            AppEvent::LinkAttempt { attempt } => {
                info!("LINK  | connect request #{}", attempt);
            }
            AppEvent::LinkUp { attempts } => {
                info!("LINK  | up after {} request(s)", attempts);
            }
            AppEvent::DiscoveryEmpty { retry_ms } => {
                info!("BUS   | no sensors, rescanning in {} ms", retry_ms);
            }
            AppEvent::DevicesDiscovered { count } => {
                info!("BUS   | {} sensor(s)", count);
            }
            AppEvent::CycleSent {
                records,
                bytes,
                summary,
            } => {
                info!(
                    "CYCLE | sent {} records ({} B) | avg={:.2}\u{00b0}C min={:.2} max={:.2}",
                    records, bytes, summary.average, summary.min, summary.max,
                );
            }
            AppEvent::CycleFailed {
                error,
                consecutive_failures,
            } => {
                warn!(
                    "CYCLE | dropped: {} (consecutive={})",
                    error, consecutive_failures
                );
            }
        }
    }
}
