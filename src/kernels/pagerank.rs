//! `PageRank` by iterative relaxation
//!
//! Based on Page et al. (1999) "The `PageRank` Citation Ranking: Bringing Order to the Web".
//!
//! Each round has two barrier-separated parallel phases over all vertices:
//!
//! 1. scatter: `cur_rank[v] / out_degree(v)` is added atomically into `next_rank[dst]`;
//!    dangling vertices add their rank to a shared dangling sum instead
//! 2. apply: `next_rank[v] = (1 - d)/N + d * (next_rank[v] + dangling/N)`, `v` counts as
//!    active when it moved by more than epsilon, and `cur_rank[v]` is zeroed
//!
//! The buffers are then swapped by handle. The run stops after `max_rounds` rounds, or
//! earlier once a round leaves no vertex active.
//!
//! # Example
//!
//! ```
//! use relax_bench::engine::Executor;
//! use relax_bench::kernels::pagerank::{pagerank, PrConfig};
//! use relax_bench::{CsrGraph, NodeId};
//!
//! let graph = CsrGraph::from_edge_list(&[
//!     (NodeId(0), NodeId(1), 1),
//!     (NodeId(1), NodeId(2), 1),
//!     (NodeId(2), NodeId(0), 1), // Cycle
//! ])
//! .unwrap();
//!
//! let exec = Executor::new(2).unwrap();
//! let result = pagerank(&exec, &graph, &PrConfig::default());
//! assert_eq!(result.ranks.len(), 3);
//! assert!((result.ranks.iter().sum::<f32>() - 1.0).abs() < 1e-5); // Sum = 1.0
//! ```

use crate::engine::{AtomicF32, Executor, LoopOptions};
use crate::storage::CsrGraph;
use tracing::{debug, trace};

/// Damping factor for `PageRank` (Google standard)
pub const DAMPING_FACTOR: f32 = 0.85;

/// Per-vertex change below which a vertex leaves the frontier
pub const EPSILON: f32 = 1e-6;

/// Round cap of the measured workload
pub const DEFAULT_MAX_ROUNDS: u32 = 10;

/// Run parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrConfig {
    /// Probability of following an out-edge
    pub damping: f32,
    /// Activity threshold on the per-vertex change
    pub epsilon: f32,
    /// Upper bound on rounds
    pub max_rounds: u32,
}

impl Default for PrConfig {
    fn default() -> Self {
        Self {
            damping: DAMPING_FACTOR,
            epsilon: EPSILON,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }
}

/// Double-buffered rank arrays
#[derive(Debug)]
pub struct PrState {
    cur_rank: Vec<AtomicF32>,
    next_rank: Vec<AtomicF32>,
}

impl PrState {
    /// Allocate and initialise state for `num_nodes` vertices
    #[must_use]
    pub fn new(num_nodes: usize) -> Self {
        let mut state = Self {
            cur_rank: (0..num_nodes).map(|_| AtomicF32::default()).collect(),
            next_rank: (0..num_nodes).map(|_| AtomicF32::default()).collect(),
        };
        state.reset();
        state
    }

    /// Uniform `1/N` ranks, empty accumulation buffer
    #[allow(clippy::cast_precision_loss)] // Graphs >16M nodes unlikely
    pub fn reset(&mut self) {
        let initial = 1.0 / self.cur_rank.len().max(1) as f32;
        for r in &self.cur_rank {
            r.store(initial);
        }
        for r in &self.next_rank {
            r.store(0.0);
        }
    }

    /// Current rank of every vertex
    #[must_use]
    pub fn ranks(&self) -> Vec<f32> {
        self.cur_rank.iter().map(AtomicF32::load).collect()
    }
}

/// Ranks plus per-round activity
#[derive(Debug, Clone, PartialEq)]
pub struct PrResult {
    /// Rank per vertex, summing to ~1
    pub ranks: Vec<f32>,
    /// Rounds executed
    pub rounds: u32,
    /// Vertices that moved by more than epsilon, per round
    pub active_per_round: Vec<usize>,
}

/// Allocate state and run `PageRank`
#[must_use]
pub fn pagerank(exec: &Executor, graph: &CsrGraph, config: &PrConfig) -> PrResult {
    let mut state = PrState::new(graph.num_nodes());
    let active_per_round = pagerank_with_state(exec, graph, config, &mut state);
    let rounds = u32::try_from(active_per_round.len()).unwrap_or(config.max_rounds);
    PrResult {
        ranks: state.ranks(),
        rounds,
        active_per_round,
    }
}

/// Run `PageRank` on preinitialised state (see [`PrState::reset`])
///
/// Returns the active-vertex count of every round executed.
#[allow(clippy::cast_precision_loss)] // Graphs >16M nodes unlikely
pub fn pagerank_with_state(
    exec: &Executor,
    graph: &CsrGraph,
    config: &PrConfig,
    state: &mut PrState,
) -> Vec<usize> {
    let n = graph.num_nodes();
    debug_assert_eq!(state.cur_rank.len(), n, "state sized for another graph");
    if n == 0 {
        return Vec::new();
    }

    #[allow(clippy::cast_possible_truncation)] // vertex ids are u32 by construction
    let range_end = n as u32;
    let damping = config.damping;
    let teleport = (1.0 - damping) / n as f32;
    let scatter_opts = LoopOptions::default();
    let mut active_per_round = Vec::new();

    for round in 0..config.max_rounds {
        let cur = &state.cur_rank;
        let next = &state.next_rank;

        // Scatter; dangling mass is summed in f64 to keep the reduction stable
        let dangling = exec.map_reduce(
            0..range_end,
            scatter_opts,
            || 0.0_f64,
            |v| {
                let rank = cur[v as usize].load();
                let degree = graph.out_degree(v);
                if degree == 0 {
                    return f64::from(rank);
                }
                let share = rank / degree as f32;
                for &dst in graph.neighbors(v) {
                    next[dst as usize].fetch_add(share);
                }
                0.0
            },
            |a, b| a + b,
        );

        #[allow(clippy::cast_possible_truncation)]
        let dangling_share = (dangling / n as f64) as f32;
        let epsilon = config.epsilon;

        // Apply damping, update frontier, clear the buffer that becomes `next`.
        // Uniform per-vertex cost, so a static partition per worker.
        let active = exec.map_reduce(
            0..range_end,
            LoopOptions::partitioned(),
            || 0_usize,
            |v| {
                let updated = teleport + damping * (next[v as usize].load() + dangling_share);
                next[v as usize].store(updated);
                let previous = cur[v as usize].load();
                cur[v as usize].store(0.0);
                usize::from((updated - previous).abs() > epsilon)
            },
            |a, b| a + b,
        );

        std::mem::swap(&mut state.cur_rank, &mut state.next_rank);
        active_per_round.push(active);
        trace!(round, active, dangling, "pagerank round");

        if active == 0 {
            break;
        }
    }

    debug!(rounds = active_per_round.len(), "pagerank finished");
    active_per_round
}

/// Sequential power iteration with the same round structure, used to verify [`pagerank`]
#[must_use]
#[allow(clippy::cast_precision_loss)] // Graphs >16M nodes unlikely
pub fn reference_pagerank(graph: &CsrGraph, config: &PrConfig) -> Vec<f32> {
    let n = graph.num_nodes();

    if n == 0 {
        return Vec::new();
    }

    let teleport = (1.0 - config.damping) / n as f32;

    // Initialize: uniform distribution
    let mut ranks = vec![1.0 / n as f32; n];
    let mut new_ranks = vec![0.0; n];
    let (row_offsets, col_indices, _edge_weights) = graph.csr_components();

    for _ in 0..config.max_rounds {
        new_ranks.fill(0.0);
        let mut dangling = 0.0_f64;

        for node in 0..n {
            let start = row_offsets[node] as usize;
            let end = row_offsets[node + 1] as usize;

            if end > start {
                let share = ranks[node] / (end - start) as f32;
                for &target in &col_indices[start..end] {
                    new_ranks[target as usize] += share;
                }
            } else {
                dangling += f64::from(ranks[node]);
            }
        }

        #[allow(clippy::cast_possible_truncation)]
        let dangling_share = (dangling / n as f64) as f32;
        let mut moved = false;
        for (new, old) in new_ranks.iter_mut().zip(&ranks) {
            *new = teleport + config.damping * (*new + dangling_share);
            moved |= (*new - old).abs() > config.epsilon;
        }

        std::mem::swap(&mut ranks, &mut new_ranks);
        if !moved {
            break;
        }
    }

    ranks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeId;

    fn graph(edges: &[(u32, u32)]) -> CsrGraph {
        let edges: Vec<_> = edges.iter().map(|&(s, d)| (NodeId(s), NodeId(d), 1)).collect();
        CsrGraph::from_edge_list(&edges).unwrap()
    }

    fn assert_sums_to_one(ranks: &[f32]) {
        let sum: f32 = ranks.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5, "Sum = {sum}");
        assert!(ranks.iter().all(|&r| r >= 0.0));
    }

    #[test]
    fn test_pagerank_five_cycle() {
        let g = graph(&[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0)]);
        let exec = Executor::new(2).unwrap();

        let result = pagerank(&exec, &g, &PrConfig::default());
        for score in &result.ranks {
            assert!((*score - 0.2).abs() < 1e-6, "Score = {score}");
        }
        // uniform start is already the fixpoint
        assert_eq!(result.rounds, 1);
        assert_eq!(result.active_per_round, vec![0]);
    }

    #[test]
    fn test_pagerank_simple_chain() {
        // Linear chain: 0 → 1 → 2, node 2 dangling
        let g = graph(&[(0, 1), (1, 2)]);
        let exec = Executor::new(2).unwrap();

        let result = pagerank(&exec, &g, &PrConfig::default());
        assert_sums_to_one(&result.ranks);
        assert!(result.ranks[2] > result.ranks[1]);
        assert!(result.ranks[1] > result.ranks[0]);
    }

    #[test]
    fn test_pagerank_star() {
        // Star: 0 ← 1, 0 ← 2, 0 ← 3 (all point to center)
        let g = graph(&[(1, 0), (2, 0), (3, 0)]);
        let exec = Executor::new(3).unwrap();

        let scores = pagerank(&exec, &g, &PrConfig::default()).ranks;
        assert_sums_to_one(&scores);
        assert!(scores[0] > scores[1]);
        assert!(scores[0] > scores[2]);
        assert!(scores[0] > scores[3]);
        assert!((scores[1] - scores[2]).abs() < 1e-6);
        assert!((scores[2] - scores[3]).abs() < 1e-6);
    }

    #[test]
    fn test_pagerank_round_cap() {
        let g = graph(&[(0, 1), (1, 2), (2, 0), (0, 2)]);
        let exec = Executor::new(1).unwrap();
        let config = PrConfig {
            max_rounds: 3,
            ..PrConfig::default()
        };

        let result = pagerank(&exec, &g, &config);
        assert_eq!(result.rounds, 3);
        assert_eq!(result.active_per_round.len(), 3);
        assert!(result.active_per_round.iter().all(|&a| a > 0));
        assert_sums_to_one(&result.ranks);
    }

    #[test]
    fn test_pagerank_matches_reference() {
        let g = graph(&[(0, 1), (0, 2), (1, 2), (2, 0), (3, 2), (4, 3), (2, 5)]);
        let exec = Executor::new(4).unwrap();
        let config = PrConfig::default();

        let parallel = pagerank(&exec, &g, &config).ranks;
        let sequential = reference_pagerank(&g, &config);
        for (p, s) in parallel.iter().zip(&sequential) {
            assert!((p - s).abs() < 1e-5, "{p} vs {s}");
        }
    }

    #[test]
    fn test_pagerank_single_node() {
        let g = graph(&[(0, 0)]); // Self-loop
        let exec = Executor::new(1).unwrap();

        let result = pagerank(&exec, &g, &PrConfig::default());
        assert_eq!(result.ranks.len(), 1);
        assert!((result.ranks[0] - 1.0).abs() < 1e-5); // Single node gets all rank
    }

    #[test]
    fn test_pagerank_empty_graph() {
        let exec = Executor::new(1).unwrap();
        let result = pagerank(&exec, &CsrGraph::new(), &PrConfig::default());
        assert!(result.ranks.is_empty());
        assert_eq!(result.rounds, 0);
        assert!(reference_pagerank(&CsrGraph::new(), &PrConfig::default()).is_empty());
    }

    #[test]
    fn test_state_reset_restarts_from_uniform() {
        let g = graph(&[(0, 1), (1, 0), (1, 2)]);
        let exec = Executor::new(2).unwrap();
        let config = PrConfig::default();
        let mut state = PrState::new(g.num_nodes());

        pagerank_with_state(&exec, &g, &config, &mut state);
        let first = state.ranks();

        state.reset();
        assert!(state.ranks().iter().all(|&r| (r - 1.0 / 3.0).abs() < 1e-7));
        pagerank_with_state(&exec, &g, &config, &mut state);
        for (a, b) in first.iter().zip(state.ranks()) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}
