//! Per-cycle telemetry batch: ordered assembly and the JSON codec.
//!
//! Record order is part of the wire contract:
//!
//! ```text
//! [ measurement × N (discovery order), onboard, avg_temp, max, min, summary ]
//! ```

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::Error;

use super::aggregate::GroupAggregate;
use super::record::{GroupStat, Measurement, OnboardSample, Record, RecordKind, Summary};

/// Largest UDP payload that fits one Ethernet frame without fragmentation.
pub const MAX_DATAGRAM_PAYLOAD: usize = 1472;

/// Values of the measurements whose location names `group`.
pub fn group_values(measurements: &[Measurement], group: &str) -> Vec<f32> {
    measurements
        .iter()
        .filter(|m| m.location == group)
        .map(|m| m.value)
        .collect()
}

/// All records for exactly one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TelemetryBatch {
    records: Vec<Record>,
}

impl TelemetryBatch {
    /// Build the batch in wire order.
    pub fn assemble(
        measurements: Vec<Measurement>,
        onboard: OnboardSample,
        group: &str,
        stats: GroupAggregate,
        timestamp: u64,
    ) -> Self {
        let mut records = Vec::with_capacity(measurements.len() + 5);
        records.extend(measurements.into_iter().map(Record::Measurement));
        records.push(Record::Onboard(onboard));

        for (kind, value) in [
            (RecordKind::AvgTemp, stats.average),
            (RecordKind::Max, stats.max),
            (RecordKind::Min, stats.min),
        ] {
            records.push(Record::Group(GroupStat {
                location: group.into(),
                value,
                kind,
                timestamp,
            }));
        }

        records.push(Record::Summary(Summary {
            kind: RecordKind::Summary,
            location: group.into(),
            avg: stats.average,
            min: stats.min,
            max: stats.max,
        }));

        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> Option<&Summary> {
        self.records.iter().rev().find_map(|r| match r {
            Record::Summary(s) => Some(s),
            _ => None,
        })
    }

    /// Serialise to the UTF-8 JSON array sent on the wire.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let bytes = serde_json::to_vec(&self.records).map_err(|_| Error::Encode)?;
        if bytes.len() > MAX_DATAGRAM_PAYLOAD {
            warn!(
                "telemetry: batch is {} bytes, over one datagram ({}); the network may drop it",
                bytes.len(),
                MAX_DATAGRAM_PAYLOAD
            );
        }
        Ok(bytes)
    }

    /// Parse a datagram produced by [`encode`](Self::encode).
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
