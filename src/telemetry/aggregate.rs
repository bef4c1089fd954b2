//! Running statistics for a named sensor group.
//!
//! The average is computed fresh every cycle from that cycle's values.
//! The min and max are extrema of those per-cycle averages over the
//! whole run: once seeded they only widen.

/// Result of one [`RunningAggregate::update`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupAggregate {
    pub average: f32,
    pub min: f32,
    pub max: f32,
}

/// Lifetime extrema of a group's per-cycle average.
///
/// `Copy` so the cycle loop can update a candidate and commit it only
/// when the cycle succeeds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningAggregate {
    extrema: Option<(f32, f32)>,
}

/// Arithmetic mean, `0.0` for an empty slice.
pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

impl RunningAggregate {
    pub const fn new() -> Self {
        Self { extrema: None }
    }

    /// Fold this cycle's group values in and report the statistics.
    ///
    /// An empty group before the first non-empty cycle reports zeros and
    /// does not seed the extrema.  Once seeded, every cycle's average
    /// (including the `0.0` of an empty cycle) is folded in.
    pub fn update(&mut self, values: &[f32]) -> GroupAggregate {
        let average = mean(values);

        let (min, max) = match self.extrema {
            Some((min, max)) => (min.min(average), max.max(average)),
            None if values.is_empty() => {
                return GroupAggregate {
                    average,
                    min: average,
                    max: average,
                };
            }
            None => (average, average),
        };
        self.extrema = Some((min, max));

        GroupAggregate { average, min, max }
    }

    /// `(min, max)` once seeded.
    pub fn extrema(&self) -> Option<(f32, f32)> {
        self.extrema
    }

    pub fn is_seeded(&self) -> bool {
        self.extrema.is_some()
    }
}
