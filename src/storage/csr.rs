//! CSR (Compressed Sparse Row) graph representation
//!
//! The graph store every kernel reads. Built once before a run and never mutated
//! afterwards, so kernels share it by `&CsrGraph` across worker threads.
//!
//! # CSR Format
//!
//! ```text
//! Graph: 0 → 1 (w=1), 0 → 2 (w=5), 1 → 2 (w=2)
//!
//! CSR:
//!   row_offsets:  [0, 2, 3, 3]  // Node 0: edges [0..2), Node 1: [2..3), Node 2: [3..3)
//!   col_indices:  [1, 2, 2]     // Edge targets
//!   edge_weights: [1, 5, 2]
//!   out_degrees:  [2, 1, 0]
//! ```

use crate::error::GraphError;
use anyhow::Result;

/// Node identifier (zero-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Immutable CSR graph with unsigned edge weights
///
/// Optimized for:
/// - O(1) access to the outgoing edge range of a vertex
/// - contiguous neighbor/weight slices for the relaxation loops
/// - precomputed out-degrees (`PageRank` scatter)
///
/// # Example
///
/// ```
/// use relax_bench::{CsrGraph, NodeId};
///
/// let graph = CsrGraph::from_edge_list(&[
///     (NodeId(0), NodeId(1), 1),
///     (NodeId(0), NodeId(2), 5),
/// ])
/// .unwrap();
///
/// assert_eq!(graph.outgoing_neighbors(NodeId(0)).unwrap(), &[1, 2]);
/// assert_eq!(graph.out_degree(0), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrGraph {
    /// node i's edges live in `row_offsets[i]..row_offsets[i + 1]`
    /// Length: `num_nodes` + 1
    row_offsets: Vec<u32>,

    /// Edge targets. Length: `num_edges`
    col_indices: Vec<u32>,

    /// Edge weights. Length: `num_edges`
    edge_weights: Vec<u32>,

    /// Length: `num_nodes`
    out_degrees: Vec<u32>,

    num_nodes: usize,
}

impl CsrGraph {
    /// Create new empty graph
    #[must_use]
    pub fn new() -> Self {
        Self {
            row_offsets: vec![0],
            col_indices: Vec::new(),
            edge_weights: Vec::new(),
            out_degrees: Vec::new(),
            num_nodes: 0,
        }
    }

    /// Create graph from edge list
    ///
    /// The vertex count is `max id + 1`. Edges keep their input order within each source.
    ///
    /// # Errors
    ///
    /// Returns error if the graph does not fit 32-bit offsets
    pub fn from_edge_list(edges: &[(NodeId, NodeId, u32)]) -> Result<Self> {
        let num_nodes = edges
            .iter()
            .flat_map(|(src, dst, _)| [src.0, dst.0])
            .max()
            .map_or(0, |max| max as usize + 1);

        Self::from_edge_list_with_nodes(num_nodes, edges)
    }

    /// Create graph with an explicit vertex count (allows trailing isolated vertices)
    ///
    /// # Errors
    ///
    /// Returns error if an endpoint is `>= num_nodes` or the graph does not fit 32-bit offsets
    pub fn from_edge_list_with_nodes(
        num_nodes: usize,
        edges: &[(NodeId, NodeId, u32)],
    ) -> Result<Self> {
        if u32::try_from(num_nodes).is_err() {
            return Err(GraphError::TooLarge(num_nodes).into());
        }
        if u32::try_from(edges.len()).is_err() {
            return Err(GraphError::TooLarge(edges.len()).into());
        }

        // Counting sort by source keeps per-source input order
        let mut out_degrees = vec![0_u32; num_nodes];
        for (src, dst, _) in edges {
            for v in [src.0, dst.0] {
                if v as usize >= num_nodes {
                    return Err(GraphError::VertexOutOfBounds {
                        vertex: v,
                        num_nodes,
                    }
                    .into());
                }
            }
            out_degrees[src.0 as usize] += 1;
        }

        let mut row_offsets = Vec::with_capacity(num_nodes + 1);
        let mut offset = 0_u32;
        row_offsets.push(offset);
        for &degree in &out_degrees {
            offset += degree;
            row_offsets.push(offset);
        }

        let mut cursor: Vec<u32> = row_offsets[..num_nodes].to_vec();
        let mut col_indices = vec![0_u32; edges.len()];
        let mut edge_weights = vec![0_u32; edges.len()];
        for (src, dst, weight) in edges {
            let slot = &mut cursor[src.0 as usize];
            col_indices[*slot as usize] = dst.0;
            edge_weights[*slot as usize] = *weight;
            *slot += 1;
        }

        Ok(Self {
            row_offsets,
            col_indices,
            edge_weights,
            out_degrees,
            num_nodes,
        })
    }

    /// Create graph from raw CSR arrays, validating every invariant
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidCsr`] when offsets are not monotone, do not start at 0,
    /// do not end at `col_indices.len()`, when weights and targets differ in length, or
    /// [`GraphError::VertexOutOfBounds`] when a target is not a vertex
    pub fn from_parts(
        row_offsets: Vec<u32>,
        col_indices: Vec<u32>,
        edge_weights: Vec<u32>,
    ) -> Result<Self> {
        let Some((&first, &last)) = row_offsets.first().zip(row_offsets.last()) else {
            return Err(GraphError::InvalidCsr("row_offsets must not be empty".into()).into());
        };
        if first != 0 {
            return Err(GraphError::InvalidCsr(format!("row_offsets[0] = {first}, expected 0")).into());
        }
        if last as usize != col_indices.len() {
            return Err(GraphError::InvalidCsr(format!(
                "last offset {last} != number of edges {}",
                col_indices.len()
            ))
            .into());
        }
        if edge_weights.len() != col_indices.len() {
            return Err(GraphError::InvalidCsr(format!(
                "{} weights for {} edges",
                edge_weights.len(),
                col_indices.len()
            ))
            .into());
        }
        if let Some(i) = row_offsets.windows(2).position(|w| w[0] > w[1]) {
            return Err(GraphError::InvalidCsr(format!(
                "row_offsets not monotone at vertex {i}: {} > {}",
                row_offsets[i],
                row_offsets[i + 1]
            ))
            .into());
        }

        let num_nodes = row_offsets.len() - 1;
        if let Some(&bad) = col_indices.iter().find(|&&t| t as usize >= num_nodes) {
            return Err(GraphError::VertexOutOfBounds {
                vertex: bad,
                num_nodes,
            }
            .into());
        }

        let out_degrees = row_offsets.windows(2).map(|w| w[1] - w[0]).collect();

        Ok(Self {
            row_offsets,
            col_indices,
            edge_weights,
            out_degrees,
            num_nodes,
        })
    }

    /// Get outgoing neighbors of a node
    ///
    /// # Errors
    ///
    /// Returns error if node ID is out of bounds
    pub fn outgoing_neighbors(&self, node: NodeId) -> Result<&[u32]> {
        if (node.0 as usize) >= self.num_nodes {
            return Err(GraphError::VertexOutOfBounds {
                vertex: node.0,
                num_nodes: self.num_nodes,
            }
            .into());
        }
        Ok(self.neighbors(node.0))
    }

    /// Targets of `v`'s outgoing edges (hot-path accessor, panics if `v` is out of bounds)
    #[inline]
    #[must_use]
    pub fn neighbors(&self, v: u32) -> &[u32] {
        let (start, end) = self.edge_range(v);
        &self.col_indices[start..end]
    }

    /// Targets and weights of `v`'s outgoing edges, same length
    #[inline]
    #[must_use]
    pub fn edges(&self, v: u32) -> (&[u32], &[u32]) {
        let (start, end) = self.edge_range(v);
        (&self.col_indices[start..end], &self.edge_weights[start..end])
    }

    #[inline]
    fn edge_range(&self, v: u32) -> (usize, usize) {
        let v = v as usize;
        (self.row_offsets[v] as usize, self.row_offsets[v + 1] as usize)
    }

    /// Out-degree of `v`
    #[inline]
    #[must_use]
    pub fn out_degree(&self, v: u32) -> u32 {
        self.out_degrees[v as usize]
    }

    /// Out-degree of every vertex
    #[must_use]
    pub fn out_degrees(&self) -> &[u32] {
        &self.out_degrees
    }

    /// Get number of nodes
    #[must_use]
    pub const fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Get number of edges
    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.col_indices.len()
    }

    /// True when at least one edge weight differs from 1
    #[must_use]
    pub fn is_weighted(&self) -> bool {
        self.edge_weights.iter().any(|&w| w != 1)
    }

    /// Iterate over all edges as `(source, target, weight)`
    pub fn iter_edges(&self) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
        (0..self.num_nodes).flat_map(move |src| {
            #[allow(clippy::cast_possible_truncation)] // num_nodes checked against u32 at build
            let src = src as u32;
            let (targets, weights) = self.edges(src);
            targets
                .iter()
                .zip(weights)
                .map(move |(&dst, &weight)| (src, dst, weight))
        })
    }

    /// True when every edge `u → v` has a matching `v → u`
    ///
    /// Label propagation only computes weakly connected components on symmetric graphs.
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        let mut forward: Vec<(u32, u32)> = self.iter_edges().map(|(s, d, _)| (s, d)).collect();
        let mut backward: Vec<(u32, u32)> = forward.iter().map(|&(s, d)| (d, s)).collect();
        forward.sort_unstable();
        forward.dedup();
        backward.sort_unstable();
        backward.dedup();
        forward == backward
    }

    /// Copy of the graph with every edge present in both directions
    ///
    /// Duplicate `(src, dst)` pairs collapse to one edge carrying the smallest weight.
    /// Neighbor lists of the result are sorted.
    ///
    /// # Errors
    ///
    /// Returns error if the doubled edge set does not fit 32-bit offsets
    pub fn symmetrized(&self) -> Result<Self> {
        let mut pairs: Vec<(u32, u32, u32)> = Vec::with_capacity(self.num_edges() * 2);
        for (src, dst, weight) in self.iter_edges() {
            pairs.push((src, dst, weight));
            pairs.push((dst, src, weight));
        }
        pairs.sort_unstable();
        pairs.dedup_by(|later, earlier| later.0 == earlier.0 && later.1 == earlier.1);

        let edges: Vec<_> = pairs
            .into_iter()
            .map(|(s, d, w)| (NodeId(s), NodeId(d), w))
            .collect();
        Self::from_edge_list_with_nodes(self.num_nodes, &edges)
    }

    /// Get CSR components (`row_offsets`, `col_indices`, `edge_weights`)
    #[must_use]
    pub fn csr_components(&self) -> (&[u32], &[u32], &[u32]) {
        (&self.row_offsets, &self.col_indices, &self.edge_weights)
    }
}

impl Default for CsrGraph {
    fn default() -> Self {
        Self::new()
    }
}
