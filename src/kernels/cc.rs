//! Connected components by synchronous label propagation
//!
//! Every vertex starts labelled with its own id and repeatedly pushes its label to its
//! out-neighbors with an atomic minimum. A vertex only propagates when its label dropped
//! since it last propagated (`comp_old > comp_current`), so converged regions go quiet.
//! Rounds are separated by a [`LogicalOr`] reduction; the run stops after the first round
//! in which nobody propagated.
//!
//! Propagation follows edge direction. On a symmetric edge set (see
//! [`CsrGraph::symmetrized`]) the fixpoint labels every vertex with the smallest id of its
//! weakly-connected component.

use crate::engine::{atomic_min, Executor, LogicalOr, LoopOptions};
use crate::storage::CsrGraph;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, trace};

/// `comp_old` value of a vertex that has not propagated yet
const UNPROPAGATED: u32 = u32::MAX;

/// Per-vertex labels, allocated once per graph
#[derive(Debug)]
pub struct CcState {
    comp_current: Vec<AtomicU32>,
    comp_old: Vec<AtomicU32>,
}

impl CcState {
    /// Allocate and initialise state for `num_nodes` vertices
    #[must_use]
    pub fn new(num_nodes: usize) -> Self {
        let mut state = Self {
            comp_current: (0..num_nodes).map(|_| AtomicU32::new(0)).collect(),
            comp_old: (0..num_nodes).map(|_| AtomicU32::new(0)).collect(),
        };
        state.reset();
        state
    }

    /// Label every vertex with its own id, nothing propagated
    #[allow(clippy::cast_possible_truncation)] // vertex ids are u32 by construction
    pub fn reset(&mut self) {
        for (v, (cur, old)) in self
            .comp_current
            .iter_mut()
            .zip(&mut self.comp_old)
            .enumerate()
        {
            *cur.get_mut() = v as u32;
            *old.get_mut() = UNPROPAGATED;
        }
    }

    /// Current label of `v`
    #[must_use]
    pub fn label(&self, v: u32) -> u32 {
        self.comp_current[v as usize].load(Ordering::Relaxed)
    }

    /// Snapshot of every label
    #[must_use]
    pub fn labels(&self) -> Vec<u32> {
        self.comp_current
            .iter()
            .map(|c| c.load(Ordering::Relaxed))
            .collect()
    }
}

/// Component label per vertex plus the number of rounds run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CcResult {
    /// Component label (smallest reachable id on symmetric input)
    pub labels: Vec<u32>,
    /// Rounds executed, including the final quiet round
    pub rounds: u32,
}

impl CcResult {
    /// Number of distinct labels
    #[must_use]
    pub fn num_components(&self) -> usize {
        count_components(&self.labels)
    }

    /// Size of the largest component (0 on an empty graph)
    #[must_use]
    pub fn largest_component(&self) -> usize {
        component_sizes(&self.labels)
            .into_values()
            .max()
            .unwrap_or(0)
    }
}

/// Number of distinct labels in `labels`
#[must_use]
pub fn count_components(labels: &[u32]) -> usize {
    component_sizes(labels).len()
}

/// Vertex count per label
#[must_use]
pub fn component_sizes(labels: &[u32]) -> HashMap<u32, usize> {
    let mut sizes = HashMap::new();
    for &label in labels {
        *sizes.entry(label).or_insert(0) += 1;
    }
    sizes
}

/// Allocate state and propagate labels to a fixpoint
#[must_use]
pub fn label_propagation(exec: &Executor, graph: &CsrGraph) -> CcResult {
    let state = CcState::new(graph.num_nodes());
    let rounds = label_propagation_with_state(exec, graph, &state);
    CcResult {
        labels: state.labels(),
        rounds,
    }
}

/// Propagate labels on preinitialised state (see [`CcState::reset`]), returning rounds run
///
/// Running again on converged state performs a single quiet round and changes nothing.
pub fn label_propagation_with_state(exec: &Executor, graph: &CsrGraph, state: &CcState) -> u32 {
    let num_nodes = graph.num_nodes();
    debug_assert_eq!(state.comp_current.len(), num_nodes, "state sized for another graph");

    #[allow(clippy::cast_possible_truncation)] // vertex ids are u32 by construction
    let range_end = num_nodes as u32;

    let changed = LogicalOr::new();
    let opts = LoopOptions::default();
    let mut rounds = 0;

    loop {
        rounds += 1;
        changed.reset();

        exec.for_each(0..range_end, opts, |v| {
            let current = state.comp_current[v as usize].load(Ordering::Relaxed);
            let old = &state.comp_old[v as usize];
            if old.load(Ordering::Relaxed) <= current {
                return;
            }
            old.store(current, Ordering::Relaxed);
            for &dst in graph.neighbors(v) {
                atomic_min(&state.comp_current[dst as usize], current);
            }
            changed.update(true);
        });

        let again = changed.reduce();
        trace!(round = rounds, changed = again, "label propagation round");
        if !again {
            break;
        }
    }

    debug!(rounds, "label propagation converged");
    rounds
}

/// Sequential union-find reference: each vertex labelled with the smallest id of its
/// weakly-connected component, edge direction ignored
#[must_use]
#[allow(clippy::cast_possible_truncation)] // vertex ids are u32 by construction
pub fn union_find_components(graph: &CsrGraph) -> Vec<u32> {
    fn find(parent: &mut [u32], mut x: u32) -> u32 {
        while parent[x as usize] != x {
            // Path halving
            let grand = parent[parent[x as usize] as usize];
            parent[x as usize] = grand;
            x = grand;
        }
        x
    }

    let n = graph.num_nodes();
    let mut parent: Vec<u32> = (0..n as u32).collect();

    for (src, dst, _) in graph.iter_edges() {
        let a = find(&mut parent, src);
        let b = find(&mut parent, dst);
        // Smaller root wins so the root is the component minimum
        match a.cmp(&b) {
            std::cmp::Ordering::Less => parent[b as usize] = a,
            std::cmp::Ordering::Greater => parent[a as usize] = b,
            std::cmp::Ordering::Equal => {}
        }
    }

    (0..n as u32).map(|v| find(&mut parent, v)).collect()
}
