//! Output drivers: the status indicator and its patterns.

pub mod indicator;

pub use indicator::{Pattern, StatusLed};
