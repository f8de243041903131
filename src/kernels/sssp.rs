//! Delta-stepping single-source shortest paths
//!
//! Based on Meyer & Sanders (2003) "Δ-stepping: a parallelizable shortest path algorithm".
//!
//! Work items `(vertex, distance)` are filed into buckets of width `2^shift` by
//! [`DeltaIndexer`]. The lowest bucket is drained in parallel; successful relaxations
//! reinsert their target, possibly into the bucket being drained (light edges), so the
//! same bucket index can come back several times before the worklist advances. The run
//! ends at quiescence: no bucket holds an item and no phase is running.
//!
//! # Example
//!
//! ```
//! use relax_bench::engine::Executor;
//! use relax_bench::kernels::sssp::{delta_step, SsspConfig};
//! use relax_bench::{CsrGraph, NodeId};
//!
//! let graph = CsrGraph::from_edge_list(&[
//!     (NodeId(0), NodeId(1), 1),
//!     (NodeId(1), NodeId(2), 2),
//!     (NodeId(0), NodeId(2), 5),
//! ])
//! .unwrap();
//!
//! let exec = Executor::new(2).unwrap();
//! let result = delta_step(&exec, &graph, &SsspConfig::new(0)).unwrap();
//! assert_eq!(result.distances, vec![0, 1, 3]);
//! ```

use crate::engine::{relax_if_smaller, BucketWorklist, Executor, Indexer, LoopOptions};
use crate::error::GraphError;
use crate::storage::CsrGraph;
use anyhow::Result;
use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, trace};

/// Distance of a vertex the source cannot reach
pub const INFINITY: u32 = u32::MAX;

/// Default bucket width exponent (delta = 8192)
pub const DEFAULT_SHIFT: u32 = 13;

const CHUNK_SIZE: usize = 512;

/// Pending relaxation: `vertex` was reached with `distance`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkItem {
    /// Vertex whose out-edges are to be relaxed
    pub vertex: u32,
    /// Distance snapshot taken when the item was produced
    pub distance: u32,
}

/// Bucket policy: `distance >> shift`, smaller first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeltaIndexer {
    /// Bucket width is `2^shift`
    pub shift: u32,
}

impl Indexer<WorkItem> for DeltaIndexer {
    #[inline]
    fn index(&self, item: &WorkItem) -> u32 {
        item.distance.checked_shr(self.shift).unwrap_or(0)
    }
}

/// Candidate distance through an edge; saturates at [`INFINITY`] instead of wrapping
#[inline]
#[must_use]
pub const fn apply_weight(weight: u32, distance: u32) -> u32 {
    distance.saturating_add(weight)
}

/// Run parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SsspConfig {
    /// Source vertex
    pub source: u32,
    /// Bucket width exponent
    pub shift: u32,
}

impl SsspConfig {
    /// Config for `source` with the default shift
    #[must_use]
    pub const fn new(source: u32) -> Self {
        Self {
            source,
            shift: DEFAULT_SHIFT,
        }
    }

    /// Override the bucket width exponent
    #[must_use]
    pub const fn with_shift(mut self, shift: u32) -> Self {
        self.shift = shift;
        self
    }
}

/// Tentative distances, shared by every worker for the whole run
#[derive(Debug)]
pub struct SsspState {
    distances: Vec<AtomicU32>,
}

impl SsspState {
    /// Allocate state for `num_nodes` vertices, all unreachable
    #[must_use]
    pub fn new(num_nodes: usize) -> Self {
        Self {
            distances: (0..num_nodes).map(|_| AtomicU32::new(INFINITY)).collect(),
        }
    }

    /// Set every distance to [`INFINITY`] and the source to 0
    pub fn reset(&mut self, source: u32) {
        for d in &mut self.distances {
            *d.get_mut() = INFINITY;
        }
        if let Some(d) = self.distances.get_mut(source as usize) {
            *d.get_mut() = 0;
        }
    }

    /// Current distance of `v`
    #[must_use]
    pub fn distance(&self, v: u32) -> u32 {
        self.distances[v as usize].load(Ordering::Relaxed)
    }

    /// Snapshot of every distance
    #[must_use]
    pub fn to_vec(&self) -> Vec<u32> {
        self.distances.iter().map(|d| d.load(Ordering::Relaxed)).collect()
    }

    /// Consume the state into plain distances
    #[must_use]
    pub fn into_distances(self) -> Vec<u32> {
        self.distances.into_iter().map(AtomicU32::into_inner).collect()
    }
}

/// Work statistics of one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SsspStats {
    /// Bucket drains, counting repeated drains of the same bucket index
    pub rounds: u64,
    /// Successful distance updates (each one produced a work item)
    pub relaxations: u64,
    /// Items dropped because a better distance had already been recorded
    pub stale_items: u64,
}

/// Distances plus work counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsspResult {
    /// Shortest distance per vertex, [`INFINITY`] when unreachable
    pub distances: Vec<u32>,
    /// Bucket drains
    pub rounds: u64,
    /// Successful distance updates
    pub relaxations: u64,
}

/// Allocate state and run delta-stepping from `config.source`
///
/// Edge weights are unsigned, so the non-negative-weight precondition always holds.
///
/// # Errors
///
/// Returns [`GraphError::VertexOutOfBounds`] when the source is not a vertex
pub fn delta_step(exec: &Executor, graph: &CsrGraph, config: &SsspConfig) -> Result<SsspResult> {
    let mut state = SsspState::new(graph.num_nodes());
    state.reset(config.source);
    let stats = delta_step_with_state(exec, graph, config, &state)?;
    Ok(SsspResult {
        distances: state.into_distances(),
        rounds: stats.rounds,
        relaxations: stats.relaxations,
    })
}

/// Run delta-stepping on preinitialised state (see [`SsspState::reset`])
///
/// This is the timed entry point: it performs no allocation proportional to the graph.
///
/// # Errors
///
/// Returns [`GraphError::VertexOutOfBounds`] when the source is not a vertex
pub fn delta_step_with_state(
    exec: &Executor,
    graph: &CsrGraph,
    config: &SsspConfig,
    state: &SsspState,
) -> Result<SsspStats> {
    let num_nodes = graph.num_nodes();
    if config.source as usize >= num_nodes {
        return Err(GraphError::VertexOutOfBounds {
            vertex: config.source,
            num_nodes,
        }
        .into());
    }
    debug_assert_eq!(state.distances.len(), num_nodes, "state sized for another graph");
    debug_assert_eq!(state.distance(config.source), 0, "state not reset for this source");

    let dist = &state.distances;
    let mut worklist = BucketWorklist::new(DeltaIndexer {
        shift: config.shift,
    });
    worklist.push(WorkItem {
        vertex: config.source,
        distance: 0,
    });

    let opts = LoopOptions::stealing(CHUNK_SIZE);
    let mut stats = SsspStats::default();

    while let Some((bucket, items)) = worklist.pop_min_bucket() {
        stats.rounds += 1;
        trace!(bucket, items = items.len(), "draining bucket");

        let produced = exec.for_each_push(&items, opts, |item: &WorkItem, out: &mut Vec<(WorkItem, bool)>| {
            let current = dist[item.vertex as usize].load(Ordering::Relaxed);
            if item.distance > current {
                out.push((*item, false));
                return;
            }
            let (targets, weights) = graph.edges(item.vertex);
            for (&dst, &weight) in targets.iter().zip(weights) {
                let candidate = apply_weight(weight, current);
                if relax_if_smaller(&dist[dst as usize], candidate) {
                    out.push((
                        WorkItem {
                            vertex: dst,
                            distance: candidate,
                        },
                        true,
                    ));
                }
            }
        });

        for buffer in produced {
            let produced_items = buffer.len();
            let queued = worklist.len();
            worklist.extend(
                buffer
                    .into_iter()
                    .filter_map(|(item, relaxed)| relaxed.then_some(item)),
            );
            let pushed = worklist.len() - queued;
            stats.relaxations += pushed as u64;
            stats.stale_items += (produced_items - pushed) as u64;
        }
    }

    debug!(
        rounds = stats.rounds,
        relaxations = stats.relaxations,
        stale = stats.stale_items,
        "delta-stepping reached quiescence"
    );
    Ok(stats)
}

/// State for Dijkstra's priority queue
#[derive(Clone, Copy, PartialEq, Eq)]
struct State {
    cost: u32,
    node: u32,
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| self.node.cmp(&other.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

/// Sequential Dijkstra reference used to verify [`delta_step`]
///
/// Returns one distance per vertex, [`INFINITY`] for unreachable vertices and for every
/// vertex when `source` is out of bounds.
#[must_use]
pub fn dijkstra(graph: &CsrGraph, source: u32) -> Vec<u32> {
    let n = graph.num_nodes();
    let mut distances = vec![INFINITY; n];
    if source as usize >= n {
        return distances;
    }

    let mut heap = BinaryHeap::new();
    distances[source as usize] = 0;
    heap.push(State {
        cost: 0,
        node: source,
    });

    while let Some(State { cost, node }) = heap.pop() {
        // Skip if we've found a better path
        if cost > distances[node as usize] {
            continue;
        }

        let (targets, weights) = graph.edges(node);
        for (&next, &weight) in targets.iter().zip(weights) {
            let next_cost = apply_weight(weight, cost);
            if next_cost < distances[next as usize] {
                distances[next as usize] = next_cost;
                heap.push(State {
                    cost: next_cost,
                    node: next,
                });
            }
        }
    }

    distances
}
