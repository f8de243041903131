//! Parallel execution engine consumed by the kernels
//!
//! The kernels only rely on four primitives:
//! - parallel iteration over a work source with chunking and an optional steal flag
//!   ([`Executor`])
//! - an ordered bucket worklist ([`BucketWorklist`])
//! - atomic compare-and-swap and atomic-minimum ([`atomic`])
//! - a global logical-OR reduction ([`LogicalOr`])
//!
//! A `rayon` work-stealing pool backs the executor. The pool is owned by the executor
//! value (no global pool), so a measurement harness controls when worker threads exist.

pub mod atomic;
pub mod reduce;
pub mod worklist;

pub use atomic::{atomic_min, relax_if_smaller, AtomicF32};
pub use reduce::LogicalOr;
pub use worklist::{BucketWorklist, Indexer};

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::ops::Range;

/// Default chunk size handed to a worker at a time
pub const DEFAULT_CHUNK_SIZE: usize = 512;

/// Scheduling flags for one parallel loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopOptions {
    /// Smallest number of consecutive items a worker processes as one task
    pub chunk_size: usize,
    /// `true`: chunks are stolen dynamically. `false`: one contiguous partition per worker
    pub steal: bool,
}

impl LoopOptions {
    /// Work-stealing loop with the given chunk size
    #[must_use]
    pub const fn stealing(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            steal: true,
        }
    }

    /// Static contiguous partitioning, one block per worker
    #[must_use]
    pub const fn partitioned() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            steal: false,
        }
    }
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self::stealing(DEFAULT_CHUNK_SIZE)
    }
}

/// Fixed pool of worker threads draining parallel loops
///
/// # Example
///
/// ```
/// use relax_bench::engine::{Executor, LoopOptions};
/// use std::sync::atomic::{AtomicU64, Ordering};
///
/// let exec = Executor::new(2).unwrap();
/// let sum = AtomicU64::new(0);
/// exec.for_each(0..100, LoopOptions::default(), |i| {
///     sum.fetch_add(u64::from(i), Ordering::Relaxed);
/// });
/// assert_eq!(sum.into_inner(), 4950);
/// ```
#[derive(Debug)]
pub struct Executor {
    pool: rayon::ThreadPool,
}

impl Executor {
    /// Spawn a pool with `threads` workers (`0` lets rayon pick one per core)
    ///
    /// # Errors
    ///
    /// Returns error if the operating system refuses to spawn the worker threads
    pub fn new(threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("relax-worker-{i}"))
            .build()
            .context("Failed to build worker pool")?;
        Ok(Self { pool })
    }

    /// Pool with one worker per available core
    ///
    /// # Errors
    ///
    /// Returns error if the operating system refuses to spawn the worker threads
    pub fn current() -> Result<Self> {
        Self::new(0)
    }

    /// Number of worker threads
    #[must_use]
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `op` inside the pool
    pub fn install<R, Op>(&self, op: Op) -> R
    where
        R: Send,
        Op: FnOnce() -> R + Send,
    {
        self.pool.install(op)
    }

    fn min_len(&self, len: usize, opts: LoopOptions) -> usize {
        if opts.steal {
            opts.chunk_size.max(1)
        } else {
            len.div_ceil(self.threads()).max(1)
        }
    }

    /// Call `op` once for every index in `range`, unordered
    pub fn for_each<F>(&self, range: Range<u32>, opts: LoopOptions, op: F)
    where
        F: Fn(u32) + Sync + Send,
    {
        let min = self.min_len(range.len(), opts);
        self.install(|| range.into_par_iter().with_min_len(min).for_each(op));
    }

    /// Map every index in `range` and combine the results with an associative `combine`
    pub fn map_reduce<T, Id, M, C>(
        &self,
        range: Range<u32>,
        opts: LoopOptions,
        identity: Id,
        map: M,
        combine: C,
    ) -> T
    where
        T: Send,
        Id: Fn() -> T + Sync + Send,
        M: Fn(u32) -> T + Sync + Send,
        C: Fn(T, T) -> T + Sync + Send,
    {
        let min = self.min_len(range.len(), opts);
        self.install(|| {
            range
                .into_par_iter()
                .with_min_len(min)
                .map(map)
                .reduce(identity, combine)
        })
    }

    /// Process `items` in parallel; `op` may push follow-up work into a worker-local buffer
    ///
    /// Returns the non-empty worker buffers, to be merged into a worklist after the loop.
    pub fn for_each_push<T, U, F>(&self, items: &[T], opts: LoopOptions, op: F) -> Vec<Vec<U>>
    where
        T: Sync,
        U: Send,
        F: Fn(&T, &mut Vec<U>) + Sync + Send,
    {
        let min = self.min_len(items.len(), opts);
        self.install(|| {
            items
                .par_iter()
                .with_min_len(min)
                .fold(Vec::new, |mut out, item| {
                    op(item, &mut out);
                    out
                })
                .filter(|out| !out.is_empty())
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_executor_thread_count() {
        let exec = Executor::new(3).unwrap();
        assert_eq!(exec.threads(), 3);
        assert_eq!(exec.install(rayon::current_num_threads), 3);
    }

    #[test]
    fn test_current_has_workers() {
        let exec = Executor::current().unwrap();
        assert!(exec.threads() >= 1);
        assert_eq!(exec.install(rayon::current_num_threads), exec.threads());
    }

    #[test]
    fn test_for_each_visits_every_index_once() {
        let exec = Executor::new(4).unwrap();
        let hits: Vec<AtomicU32> = (0..1000).map(|_| AtomicU32::new(0)).collect();

        for opts in [LoopOptions::stealing(7), LoopOptions::partitioned()] {
            exec.for_each(0..1000, opts, |i| {
                hits[i as usize].fetch_add(1, Ordering::Relaxed);
            });
        }
        assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 2));
    }

    #[test]
    fn test_map_reduce_sum() {
        let exec = Executor::new(2).unwrap();
        let total = exec.map_reduce(0..101, LoopOptions::default(), || 0_u64, u64::from, |a, b| a + b);
        assert_eq!(total, 5050);

        let empty = exec.map_reduce(0..0, LoopOptions::partitioned(), || 0_u64, u64::from, |a, b| a + b);
        assert_eq!(empty, 0);
    }

    #[test]
    fn test_for_each_push_collects_all_outputs() {
        let exec = Executor::new(4).unwrap();
        let items: Vec<u32> = (0..500).collect();

        let buffers = exec.for_each_push(&items, LoopOptions::stealing(16), |&i, out| {
            if i % 5 == 0 {
                out.push(i * 2);
            }
        });

        let mut produced: Vec<u32> = buffers.into_iter().flatten().collect();
        produced.sort_unstable();
        let expected: Vec<u32> = (0..500).filter(|i| i % 5 == 0).map(|i| i * 2).collect();
        assert_eq!(produced, expected);
    }
}
