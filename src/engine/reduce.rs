//! Global reductions usable across bulk-synchronous rounds

use std::sync::atomic::{AtomicBool, Ordering};

/// Logical-OR reduction: any worker may raise it during a round, the driver reads the
/// combined value once the parallel loop has returned (the loop's join is the barrier)
#[derive(Debug, Default)]
pub struct LogicalOr(AtomicBool);

impl LogicalOr {
    /// New reducer holding `false`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear before a new round
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    /// Contribute one worker's value
    #[inline]
    pub fn update(&self, value: bool) {
        // skip the store when already raised to keep the cache line shared
        if value && !self.0.load(Ordering::Relaxed) {
            self.0.store(true, Ordering::Relaxed);
        }
    }

    /// Combined value of every update since the last reset
    #[must_use]
    pub fn reduce(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
