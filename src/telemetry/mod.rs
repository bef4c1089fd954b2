//! Telemetry model: record types, the cross-cycle group aggregate and
//! per-cycle batch assembly.

pub mod aggregate;
pub mod batch;
pub mod record;

pub use aggregate::{GroupAggregate, RunningAggregate};
pub use batch::TelemetryBatch;
pub use record::{Measurement, OnboardSample, Record, RecordKind};
