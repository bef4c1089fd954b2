//! Fuzz target: `TelemetryConfig::from_json`
//!
//! Arbitrary documents must either be rejected or yield a config that
//! passes validation and resolves a usable destination.
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use libfuzzer_sys::fuzz_target;
use pondtemp::config::TelemetryConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(doc) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = TelemetryConfig::from_json(doc) {
        assert!(config.validate().is_ok());
        assert_ne!(config.destination().port(), 0);
        assert!(config.alarm.low_c < config.alarm.high_c);
    }
});
