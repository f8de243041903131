//! Lock-free update primitives shared by the relaxation kernels
//!
//! Every mutable per-vertex value is a single atomic word; concurrent writers resolve
//! conflicts with compare-and-swap retry loops, never with locks.

use std::sync::atomic::{AtomicU32, Ordering};

/// Atomically lower `cell` to `value` if `value` is smaller
///
/// Returns `true` when this call performed the update. Retries under contention until
/// either the store succeeds or another thread has already stored something `<= value`.
#[inline]
pub fn atomic_min(cell: &AtomicU32, value: u32) -> bool {
    let mut current = cell.load(Ordering::Relaxed);
    while value < current {
        match cell.compare_exchange_weak(current, value, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return true,
            Err(actual) => current = actual,
        }
    }
    false
}

/// SSSP "relax if smaller": lower a tentative distance, reporting whether it improved
#[inline]
pub fn relax_if_smaller(distance: &AtomicU32, candidate: u32) -> bool {
    atomic_min(distance, candidate)
}

/// `f32` cell with atomic load/store/add, stored as raw bits in an [`AtomicU32`]
#[derive(Debug, Default)]
#[repr(transparent)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    /// New cell holding `value`
    #[must_use]
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    /// Current value
    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    /// Overwrite the value
    #[inline]
    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Atomically add `delta`, returning the previous value
    #[inline]
    pub fn fetch_add(&self, delta: f32) -> f32 {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            let next = (f32::from_bits(current) + delta).to_bits();
            match self
                .0
                .compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(previous) => return f32::from_bits(previous),
                Err(actual) => current = actual,
            }
        }
    }
}
