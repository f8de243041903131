//! PBBS adjacency-graph text format
//!
//! # Format
//!
//! ```text
//! AdjacencyGraph            (or WeightedAdjacencyGraph)
//! <n>
//! <m>
//! <offset_0> ... <offset_{n-1}>
//! <edge_0> ... <edge_{m-1}>
//! [<weight_0> ... <weight_{m-1}>]   (weighted only)
//! ```
//!
//! One token per line in files produced by `snap-to-adj`; any whitespace is accepted.
//! Unweighted graphs get unit weights.

use super::CsrGraph;
use crate::error::GraphError;
use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;

const UNWEIGHTED_HEADER: &str = "AdjacencyGraph";
const WEIGHTED_HEADER: &str = "WeightedAdjacencyGraph";

/// Whitespace tokenizer that remembers line numbers for error messages
struct Tokens<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    current: std::str::SplitWhitespace<'a>,
    line: usize,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
            current: "".split_whitespace(),
            line: 0,
        }
    }

    fn next_token(&mut self) -> Option<&'a str> {
        loop {
            if let Some(tok) = self.current.next() {
                return Some(tok);
            }
            let (idx, line) = self.lines.next()?;
            self.line = idx + 1;
            self.current = line.split_whitespace();
        }
    }

    fn next_u32(&mut self, what: &'static str) -> Result<u32, GraphError> {
        let token = self.next_token().ok_or(GraphError::UnexpectedEof { what })?;
        token.parse().map_err(|_| GraphError::BadToken {
            line: self.line,
            token: token.to_string(),
            what,
        })
    }

    fn read_vec(&mut self, len: usize, what: &'static str) -> Result<Vec<u32>, GraphError> {
        (0..len).map(|_| self.next_u32(what)).collect()
    }
}

/// Parse a graph from PBBS adjacency text
///
/// # Errors
///
/// Returns [`GraphError`] for an unknown header, truncated input, non-numeric tokens, or
/// offsets/targets that do not form a valid CSR
pub fn parse_adjacency(text: &str) -> Result<CsrGraph> {
    let mut tokens = Tokens::new(text);

    let header = tokens
        .next_token()
        .ok_or(GraphError::UnexpectedEof { what: "header" })?;
    let weighted = match header {
        UNWEIGHTED_HEADER => false,
        WEIGHTED_HEADER => true,
        other => return Err(GraphError::UnknownHeader(other.to_string()).into()),
    };

    let n = tokens.next_u32("vertex count")? as usize;
    let m = tokens.next_u32("edge count")? as usize;

    let mut row_offsets = tokens.read_vec(n, "offset")?;
    #[allow(clippy::cast_possible_truncation)] // m was read as u32
    row_offsets.push(m as u32);
    let col_indices = tokens.read_vec(m, "edge target")?;
    let edge_weights = if weighted {
        tokens.read_vec(m, "edge weight")?
    } else {
        vec![1; m]
    };

    CsrGraph::from_parts(row_offsets, col_indices, edge_weights)
}

/// PBBS adjacency text of a graph, one token per line
#[derive(Debug, Clone, Copy)]
pub struct AdjacencyText<'a> {
    graph: &'a CsrGraph,
    weighted: bool,
}

impl<'a> AdjacencyText<'a> {
    /// Weighted variant when `weighted` is true
    #[must_use]
    pub fn new(graph: &'a CsrGraph, weighted: bool) -> Self {
        Self { graph, weighted }
    }
}

impl fmt::Display for AdjacencyText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (row_offsets, col_indices, edge_weights) = self.graph.csr_components();
        let num_nodes = self.graph.num_nodes();

        writeln!(f, "{}", if self.weighted { WEIGHTED_HEADER } else { UNWEIGHTED_HEADER })?;
        writeln!(f, "{num_nodes}")?;
        writeln!(f, "{}", self.graph.num_edges())?;
        for offset in &row_offsets[..num_nodes] {
            writeln!(f, "{offset}")?;
        }
        for target in col_indices {
            writeln!(f, "{target}")?;
        }
        if self.weighted {
            for weight in edge_weights {
                writeln!(f, "{weight}")?;
            }
        }
        Ok(())
    }
}

/// Render a graph as PBBS adjacency text
///
/// Writes the weighted variant when `weighted` is true.
#[must_use]
pub fn to_adjacency_string(graph: &CsrGraph, weighted: bool) -> String {
    AdjacencyText::new(graph, weighted).to_string()
}

/// Read a PBBS adjacency file
///
/// # Errors
///
/// Returns error if the file cannot be read or does not parse
pub async fn read_adjacency<P: AsRef<Path>>(path: P) -> Result<CsrGraph> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading adjacency graph {}", path.display()))?;
    parse_adjacency(&text).with_context(|| format!("parsing adjacency graph {}", path.display()))
}

/// Write a PBBS adjacency file
///
/// # Errors
///
/// Returns error if the file cannot be written
pub async fn write_adjacency<P: AsRef<Path>>(graph: &CsrGraph, path: P, weighted: bool) -> Result<()> {
    let path = path.as_ref();
    tokio::fs::write(path, to_adjacency_string(graph, weighted))
        .await
        .with_context(|| format!("writing adjacency graph {}", path.display()))
}
