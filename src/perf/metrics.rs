//! Metrics derived from raw counter readings

use super::counters::{
    CounterReadings, CYCLES, INSTRUCTIONS, L1D_PEND_MISS, L1D_PEND_MISS_CYCLES, STALLS_MEM_ANY,
};
use serde::{Deserialize, Serialize};

/// Ratios computed from one measured run
///
/// A metric is `None` when one of its inputs was not counted or its denominator is zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    /// Instructions per cycle
    pub ipc: Option<f64>,
    /// Memory-level parallelism: average outstanding L1D misses while any is outstanding
    pub mlp: Option<f64>,
    /// Percentage of cycles with an outstanding L1D miss
    pub memory_stall_pct: Option<f64>,
    /// Percentage of cycles stalled on the memory subsystem
    pub memory_bound_pct: Option<f64>,
}

#[allow(clippy::cast_precision_loss)] // counter values far below 2^52
fn ratio(readings: &CounterReadings, numerator: &str, denominator: &str) -> Option<f64> {
    let num = readings.get(numerator)?;
    let den = readings.get(denominator)?;
    (den > 0).then(|| num as f64 / den as f64)
}

impl DerivedMetrics {
    /// Derive every metric whose inputs are present
    #[must_use]
    pub fn from_readings(readings: &CounterReadings) -> Self {
        Self {
            ipc: ratio(readings, INSTRUCTIONS, CYCLES),
            mlp: ratio(readings, L1D_PEND_MISS, L1D_PEND_MISS_CYCLES),
            memory_stall_pct: ratio(readings, L1D_PEND_MISS_CYCLES, CYCLES).map(|r| r * 100.0),
            memory_bound_pct: ratio(readings, STALLS_MEM_ANY, CYCLES).map(|r| r * 100.0),
        }
    }

    /// True when nothing could be derived
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ipc.is_none()
            && self.mlp.is_none()
            && self.memory_stall_pct.is_none()
            && self.memory_bound_pct.is_none()
    }
}
