//! Fuzz target: `TelemetryBatch::decode`
//!
//! Feeds arbitrary datagrams to the batch decoder.  Anything that decodes
//! must re-encode.  Out-of-range numbers overflow to infinity and encode as
//! `null`, so only the record count is checked on the second pass.
//!
//! cargo fuzz run fuzz_batch_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use pondtemp::telemetry::TelemetryBatch;

fuzz_target!(|data: &[u8]| {
    let Ok(batch) = TelemetryBatch::decode(data) else {
        return;
    };
    let bytes = batch.encode().expect("decoded batch must re-encode");
    if let Ok(again) = TelemetryBatch::decode(&bytes) {
        assert_eq!(again.len(), batch.len());
    }
});
