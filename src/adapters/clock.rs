//! Wall-clock adapter.
//!
//! [`SystemClock`] implements [`ClockPort`].  On ESP-IDF the std
//! `SystemTime` is backed by `gettimeofday`, which SNTP keeps in sync;
//! on the host it is the OS clock.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::app::ports::ClockPort;

/// 2020-01-01T00:00:00Z.  Anything earlier means SNTP has not synced yet.
const EPOCH_2020: u64 = 1_577_836_800;

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }

    /// `true` once the clock holds a plausible wall-clock time.
    pub fn is_synced(&self) -> bool {
        self.epoch_secs() >= EPOCH_2020
    }
}

impl ClockPort for SystemClock {
    fn epoch_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs())
    }
}
