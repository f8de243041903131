//! Typed errors for graph construction and graph file parsing

use thiserror::Error;

/// Errors raised while building or loading a graph
#[derive(Debug, Error)]
pub enum GraphError {
    /// CSR arrays violate a structural invariant
    #[error("invalid CSR: {0}")]
    InvalidCsr(String),

    /// Vertex id outside `0..num_nodes`
    #[error("vertex {vertex} out of bounds (graph has {num_nodes} vertices)")]
    VertexOutOfBounds {
        /// Offending vertex id
        vertex: u32,
        /// Vertex count of the graph
        num_nodes: usize,
    },

    /// Adjacency file does not start with a known header
    #[error("unknown adjacency header {0:?} (expected AdjacencyGraph or WeightedAdjacencyGraph)")]
    UnknownHeader(String),

    /// Input ended before all declared tokens were read
    #[error("unexpected end of input while reading {what}")]
    UnexpectedEof {
        /// Section being read
        what: &'static str,
    },

    /// A token could not be parsed as an unsigned integer
    #[error("line {line}: cannot parse {token:?} as {what}")]
    BadToken {
        /// 1-based line number of the token
        line: usize,
        /// Raw token text
        token: String,
        /// Section being read
        what: &'static str,
    },

    /// Graph is larger than the 32-bit id space
    #[error("graph too large: {0} exceeds u32 ids")]
    TooLarge(usize),
}
