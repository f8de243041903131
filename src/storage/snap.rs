//! SNAP edge-list reader
//!
//! SNAP datasets are plain `src dst` pairs with `#` comment lines. The loader builds the
//! graph the way `snap-to-adj` converts it: vertex count is `max id + 1`, neighbor lists
//! are sorted, every edge gets weight 1.

use super::{CsrGraph, NodeId};
use crate::error::GraphError;
use anyhow::{Context, Result};
use std::path::Path;

/// Parse a SNAP edge list
///
/// Lines with fewer than two tokens are skipped, extra columns are ignored.
///
/// # Errors
///
/// Returns [`GraphError::BadToken`] when an endpoint is not an unsigned integer
pub fn parse_snap(text: &str) -> Result<CsrGraph> {
    let mut edges = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let (Some(src), Some(dst)) = (parts.next(), parts.next()) else {
            continue;
        };
        let parse = |token: &str, what| {
            token.parse::<u32>().map_err(|_| GraphError::BadToken {
                line: idx + 1,
                token: token.to_string(),
                what,
            })
        };
        edges.push((NodeId(parse(src, "source")?), NodeId(parse(dst, "target")?), 1));
    }

    // Sorted adjacency lists; stable sort keeps duplicates
    edges.sort_by_key(|(src, dst, _)| (*src, *dst));
    CsrGraph::from_edge_list(&edges)
}

/// Read a SNAP edge-list file
///
/// # Errors
///
/// Returns error if the file cannot be read or does not parse
pub async fn read_snap<P: AsRef<Path>>(path: P) -> Result<CsrGraph> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading SNAP edge list {}", path.display()))?;
    parse_snap(&text).with_context(|| format!("parsing SNAP edge list {}", path.display()))
}
