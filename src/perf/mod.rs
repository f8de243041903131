//! Measurement harness: hardware counters plus a wall-clock timer around one kernel call
//!
//! ```
//! use relax_bench::perf::Measurement;
//!
//! let mut m = Measurement::disabled();
//! let (sum, sample) = m.measure(|| (0..1000_u64).sum::<u64>());
//! assert_eq!(sum, 499_500);
//! assert!(sample.readings.is_empty());
//! ```

pub mod counters;
pub mod metrics;

pub use counters::{CounterReadings, EventKind, EventSpec, PerfCounters, DEFAULT_EVENTS};
pub use metrics::DerivedMetrics;

use std::time::{Duration, Instant};
use tracing::info;

/// Result of one measured region
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Wall-clock time of the region
    pub elapsed: Duration,
    /// Counter values accumulated inside the region
    pub readings: CounterReadings,
}

impl Sample {
    /// Elapsed time in seconds
    #[must_use]
    pub fn seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Ratios derived from the readings
    #[must_use]
    pub fn derived(&self) -> DerivedMetrics {
        DerivedMetrics::from_readings(&self.readings)
    }
}

/// Explicit measurement context; open it before spawning the worker pool
#[derive(Debug, Default)]
pub struct Measurement {
    counters: PerfCounters,
}

impl Measurement {
    /// Open the default counter table
    #[must_use]
    pub fn new() -> Self {
        let counters = PerfCounters::open_default();
        info!(counters = counters.len(), "perf counters opened");
        Self { counters }
    }

    /// Timer only, no counters
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Counters when `enabled`, timer only otherwise
    #[must_use]
    pub fn with_counters(enabled: bool) -> Self {
        if enabled {
            Self::new()
        } else {
            Self::disabled()
        }
    }

    /// The open counters
    #[must_use]
    pub fn counters(&self) -> &PerfCounters {
        &self.counters
    }

    /// Run `region` with counters enabled and the clock running, nothing else inside
    pub fn measure<T>(&mut self, region: impl FnOnce() -> T) -> (T, Sample) {
        self.counters.start();
        let start = Instant::now();
        let output = region();
        let elapsed = start.elapsed();
        self.counters.stop();

        let readings = self.counters.read();
        (output, Sample { elapsed, readings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_disabled_measurement_times_region() {
        let mut m = Measurement::disabled();
        let (value, sample) = m.measure(|| {
            std::thread::sleep(Duration::from_millis(5));
            42
        });
        assert_eq!(value, 42);
        assert!(sample.elapsed >= Duration::from_millis(5));
        assert!(sample.seconds() >= 0.005);
        assert!(sample.derived().is_empty());
    }

    #[test]
    #[serial]
    fn test_measurement_reads_only_open_counters() {
        let mut m = Measurement::with_counters(true);
        let opened = m.counters().len();
        let ((), sample) = m.measure(|| {
            std::hint::black_box((0..10_000_u64).sum::<u64>());
        });
        assert!(sample.readings.len() <= opened);
    }
}
