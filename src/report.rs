//! Verification summaries and benchmark records
//!
//! Summaries print in the suite's stdout layout (`max distance: …`, `component num: …`,
//! `max pr: …`); [`perf_report`] renders the `[PERF]` block written to stderr.
//! [`BenchmarkRecord`] is the machine-readable form, appended as one JSON line per run.

use crate::kernels::cc::component_sizes;
use crate::kernels::sssp::INFINITY;
use crate::perf::{CounterReadings, DerivedMetrics, Sample};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// SSSP verification summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SsspSummary {
    /// Largest finite distance (0 when only the source is reachable)
    pub max_distance: u32,
    /// Vertices with a finite distance
    pub reachable: usize,
    /// Vertex count
    pub num_nodes: usize,
}

impl SsspSummary {
    /// Summarise a distance array
    #[must_use]
    pub fn from_distances(distances: &[u32]) -> Self {
        let finite = distances.iter().copied().filter(|&d| d != INFINITY);
        let (max_distance, reachable) =
            finite.fold((0, 0), |(max, count), d| (max.max(d), count + 1));
        Self {
            max_distance,
            reachable,
            num_nodes: distances.len(),
        }
    }
}

impl fmt::Display for SsspSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "max distance: {}", self.max_distance)?;
        write!(f, "reachable vertices: {} / {}", self.reachable, self.num_nodes)
    }
}

/// CC verification summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcSummary {
    /// Distinct labels
    pub components: usize,
    /// Vertices in the largest component
    pub largest: usize,
}

impl CcSummary {
    /// Summarise a label array
    #[must_use]
    pub fn from_labels(labels: &[u32]) -> Self {
        let sizes = component_sizes(labels);
        Self {
            components: sizes.len(),
            largest: sizes.values().copied().max().unwrap_or(0),
        }
    }
}

impl fmt::Display for CcSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "component num: {}", self.components)?;
        write!(f, "largest component: {}", self.largest)
    }
}

/// `PageRank` verification summary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrSummary {
    /// Highest rank
    pub max_rank: f32,
    /// Sum of all ranks, ~1
    pub rank_sum: f64,
}

impl PrSummary {
    /// Summarise a rank array
    #[must_use]
    pub fn from_ranks(ranks: &[f32]) -> Self {
        Self {
            max_rank: ranks.iter().copied().fold(0.0, f32::max),
            rank_sum: ranks.iter().map(|&r| f64::from(r)).sum(),
        }
    }
}

impl fmt::Display for PrSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "max pr: {:.8}", self.max_rank)?;
        write!(f, "rank sum: {:.6}", self.rank_sum)
    }
}

/// Per-kernel summary carried by a record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kernel", rename_all = "lowercase")]
pub enum Summary {
    /// Shortest paths
    Sssp(SsspSummary),
    /// Connected components
    Cc(CcSummary),
    /// `PageRank`
    Pr(PrSummary),
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sssp(s) => s.fmt(f),
            Self::Cc(s) => s.fmt(f),
            Self::Pr(s) => s.fmt(f),
        }
    }
}

/// The `[PERF]` block for a sample
#[derive(Debug, Clone, Copy)]
pub struct PerfReport<'a>(pub &'a Sample);

impl fmt::Display for PerfReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n[PERF] === RESULTS (Algorithm Only) ===")?;
        for (name, value) in self.0.readings.iter() {
            writeln!(f, "[PERF] {name}: {value}")?;
        }

        let derived = self.0.derived();
        writeln!(f, "\n[PERF] === DERIVED METRICS ===")?;
        if let Some(ipc) = derived.ipc {
            writeln!(f, "[PERF] IPC: {ipc:.3}")?;
        }
        if let Some(mlp) = derived.mlp {
            writeln!(f, "[PERF] MLP: {mlp:.3}")?;
        }
        if let Some(pct) = derived.memory_stall_pct {
            writeln!(f, "[PERF] Memory Stall % (pending_cycles/cycles): {pct:.1}%")?;
        }
        if let Some(pct) = derived.memory_bound_pct {
            writeln!(f, "[PERF] Memory Bound % (stalls_mem_any/cycles): {pct:.1}%")?;
        }
        writeln!(f, "[PERF] ========================")
    }
}

/// Render the `[PERF]` block for a sample
#[must_use]
pub fn perf_report(sample: &Sample) -> PerfReport<'_> {
    PerfReport(sample)
}

/// One benchmark run, serialised as a JSON line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    /// Driver name (`sssp`, `cc`, `pr`)
    pub benchmark: String,
    /// Input graph path
    pub input: String,
    /// Kernel parameters
    pub params: serde_json::Map<String, serde_json::Value>,
    /// Graph vertex count
    pub num_nodes: usize,
    /// Graph edge count
    pub num_edges: usize,
    /// Worker threads
    pub threads: usize,
    /// Wall-clock seconds of the kernel
    pub elapsed_secs: f64,
    /// Raw counter values
    pub counters: CounterReadings,
    /// Derived ratios
    pub derived: DerivedMetrics,
    /// Kernel output summary
    pub summary: Summary,
}

impl BenchmarkRecord {
    /// Record of a finished run
    #[must_use]
    pub fn new(
        benchmark: &str,
        input: &Path,
        (num_nodes, num_edges): (usize, usize),
        threads: usize,
        sample: &Sample,
        summary: Summary,
    ) -> Self {
        Self {
            benchmark: benchmark.to_string(),
            input: input.display().to_string(),
            params: serde_json::Map::new(),
            num_nodes,
            num_edges,
            threads,
            elapsed_secs: sample.seconds(),
            counters: sample.readings.clone(),
            derived: sample.derived(),
            summary,
        }
    }

    /// Add a kernel parameter
    #[must_use]
    pub fn with_param(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// Append this record as one line to `path`, creating the file if needed
    ///
    /// # Errors
    ///
    /// Returns error if serialization or file I/O fails
    pub async fn append_jsonl<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut line = serde_json::to_string(self).context("Failed to serialize record")?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .with_context(|| format!("Failed to open record file: {}", path.display()))?;
        file.write_all(line.as_bytes())
            .await
            .with_context(|| format!("Failed to append record: {}", path.display()))?;
        file.flush().await?;
        Ok(())
    }
}
