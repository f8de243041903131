//! relax-bench: shared-memory parallel graph relaxation micro-benchmarks
//!
//! # Overview
//!
//! Three relaxation kernels over an immutable CSR graph, each measured for the
//! algorithm phase only (graph loading and state allocation happen outside the timer):
//!
//! - delta-stepping single-source shortest paths ([`kernels::sssp`])
//! - label-propagation connected components ([`kernels::cc`])
//! - `PageRank` with a per-round frontier ([`kernels::pagerank`])
//!
//! # Quick Start
//!
//! ```
//! use relax_bench::engine::Executor;
//! use relax_bench::kernels::{delta_step, label_propagation, SsspConfig};
//! use relax_bench::{CsrGraph, NodeId};
//!
//! # fn main() -> relax_bench::Result<()> {
//! let graph = CsrGraph::from_edge_list(&[
//!     (NodeId(0), NodeId(1), 1),
//!     (NodeId(1), NodeId(2), 2),
//!     (NodeId(0), NodeId(2), 5),
//! ])?;
//!
//! let exec = Executor::new(2)?;
//! let sssp = delta_step(&exec, &graph, &SsspConfig::new(0))?;
//! assert_eq!(sssp.distances, vec![0, 1, 3]);
//!
//! let cc = label_propagation(&exec, &graph.symmetrized()?);
//! assert_eq!(cc.num_components(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Storage**: CSR graph plus PBBS adjacency, SNAP and Parquet loaders
//! - **Engine**: `rayon` pool, bucket worklist, atomic min/add, logical-OR reduction
//! - **Kernels**: per-kernel state, relaxation operator and termination test
//! - **Perf**: `perf_event_open` counters and derived metrics around one kernel call
//! - **Report / CLI**: summaries, JSON-lines records, shared driver plumbing

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod engine;
pub mod error;
pub mod kernels;
pub mod perf;
pub mod report;
pub mod storage;

// Re-export core types
pub use engine::{Executor, LoopOptions};
pub use error::GraphError;
pub use kernels::{
    delta_step, label_propagation, pagerank, CcResult, PrConfig, PrResult, SsspConfig,
    SsspResult,
};
pub use perf::{Measurement, Sample};
pub use storage::{CsrGraph, NodeId};

// Error type
pub use anyhow::{Error, Result};
