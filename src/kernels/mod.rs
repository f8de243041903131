//! Relaxation kernels
//!
//! Each kernel owns its per-vertex state, allocated once before a timed run, and talks to
//! the parallel runtime only through [`crate::engine`]:
//! - `sssp`: delta-stepping shortest paths over a bucket worklist
//! - `cc`: label-propagation connected components in synchronous rounds
//! - `pagerank`: double-buffered `PageRank` with a per-round frontier

pub mod cc;
pub mod pagerank;
pub mod sssp;

pub use cc::{label_propagation, union_find_components, CcResult, CcState};
pub use pagerank::{pagerank, reference_pagerank, PrConfig, PrResult, PrState};
pub use sssp::{delta_step, dijkstra, SsspConfig, SsspResult, SsspState, INFINITY};
