//! Graph storage layer
//!
//! CSR graph representation plus the on-disk formats the benchmark drivers load:
//! PBBS adjacency text, SNAP edge lists and (with the `storage` feature) Parquet.

pub mod adjacency;
pub mod csr;
#[cfg(feature = "storage")]
pub mod parquet;
pub mod snap;

pub use adjacency::{parse_adjacency, read_adjacency, to_adjacency_string, write_adjacency};
pub use csr::{CsrGraph, NodeId};
pub use snap::{parse_snap, read_snap};

use anyhow::Result;
use std::path::Path;

/// On-disk graph format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    /// PBBS `AdjacencyGraph` / `WeightedAdjacencyGraph`
    Adjacency,
    /// SNAP `src dst` edge list
    Snap,
    /// Parquet edge list
    Parquet,
}

impl GraphFormat {
    /// Guess the format from a file extension (`.txt`/`.snap` → SNAP, `.parquet` →
    /// Parquet, anything else → adjacency)
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("txt" | "snap") => Self::Snap,
            Some("parquet") => Self::Parquet,
            _ => Self::Adjacency,
        }
    }
}

/// Load a graph in the given format
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed, or if Parquet is requested without
/// the `storage` feature
pub async fn load_graph(path: &Path, format: GraphFormat) -> Result<CsrGraph> {
    match format {
        GraphFormat::Adjacency => read_adjacency(path).await,
        GraphFormat::Snap => read_snap(path).await,
        #[cfg(feature = "storage")]
        GraphFormat::Parquet => CsrGraph::read_parquet(path).await,
        #[cfg(not(feature = "storage"))]
        GraphFormat::Parquet => Err(anyhow::anyhow!(
            "Parquet input requires the `storage` feature"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(GraphFormat::from_path(Path::new("g.adj")), GraphFormat::Adjacency);
        assert_eq!(GraphFormat::from_path(Path::new("soc-LiveJournal1.txt")), GraphFormat::Snap);
        assert_eq!(GraphFormat::from_path(Path::new("g.parquet")), GraphFormat::Parquet);
        assert_eq!(GraphFormat::from_path(Path::new("noext")), GraphFormat::Adjacency);
    }

    #[tokio::test]
    async fn test_load_graph_snap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edges.txt");
        tokio::fs::write(&path, "0 1\n1 2\n").await.unwrap();

        let graph = load_graph(&path, GraphFormat::from_path(&path)).await.unwrap();
        assert_eq!(graph.num_nodes(), 3);
        assert_eq!(graph.num_edges(), 2);
    }
}
