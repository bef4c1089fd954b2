//! Telemetry record types and their wire shape.
//!
//! Each record serialises to a flat JSON object.  Field names and field
//! order are what downstream consumers already parse, including the
//! historical `min_C` key on the onboard record.

use serde::{Deserialize, Serialize};

use crate::sensors::onewire::DeviceAddress;

/// Value of the `type` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    Hardware,
    #[serde(rename = "avg_temp")]
    AvgTemp,
    #[serde(rename = "max")]
    Max,
    #[serde(rename = "min")]
    Min,
    #[serde(rename = "summary")]
    Summary,
}

/// One external sensor reading for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    #[serde(rename = "type")]
    pub kind: RecordKind,
    pub value: f32,
    pub sensor: DeviceAddress,
    pub location: String,
    #[serde(rename = "time")]
    pub timestamp: u64,
    pub resolution_raw: u8,
    pub resolution_bits: u8,
    pub alarm: bool,
}

/// Onboard sensor reading with lifetime extrema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnboardSample {
    pub location: String,
    #[serde(rename = "type")]
    pub kind: RecordKind,
    pub sensor: String,
    pub value: f32,
    pub max_c: f32,
    #[serde(rename = "min_C")]
    pub min_c: f32,
    #[serde(rename = "time")]
    pub timestamp: u64,
}

/// A single group statistic: `avg_temp`, `max` or `min`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStat {
    pub location: String,
    pub value: f32,
    #[serde(rename = "type")]
    pub kind: RecordKind,
    #[serde(rename = "time")]
    pub timestamp: u64,
}

/// Average, min and max for a group in one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(rename = "type")]
    pub kind: RecordKind,
    pub location: String,
    pub avg: f32,
    pub min: f32,
    pub max: f32,
}

/// Any record that can appear in a batch.
///
/// Untagged: the variants are told apart by their field sets, tried in
/// declaration order when decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Record {
    Measurement(Measurement),
    Onboard(OnboardSample),
    Group(GroupStat),
    Summary(Summary),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Measurement(m) => m.kind,
            Self::Onboard(o) => o.kind,
            Self::Group(g) => g.kind,
            Self::Summary(s) => s.kind,
        }
    }
}
