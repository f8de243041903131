//! Shared plumbing for the benchmark drivers
//!
//! Every driver follows the same sequence:
//!
//! 1. parse arguments and set up logging
//! 2. open perf counters, before any worker thread exists so the workers inherit them
//! 3. load the graph and build the executor (not measured)
//! 4. allocate and reset kernel state (not measured)
//! 5. one measured run, then summary, `[PERF]` block and optional JSON record

use crate::perf::{Measurement, Sample};
use crate::report::{perf_report, BenchmarkRecord};
use crate::storage::{load_graph, CsrGraph, GraphFormat};
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Input format selectable on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// PBBS adjacency text
    Adj,
    /// SNAP edge list
    Snap,
    /// Parquet edge list
    Parquet,
}

impl From<InputFormat> for GraphFormat {
    fn from(format: InputFormat) -> Self {
        match format {
            InputFormat::Adj => Self::Adjacency,
            InputFormat::Snap => Self::Snap,
            InputFormat::Parquet => Self::Parquet,
        }
    }
}

/// Options common to every benchmark driver
#[derive(Debug, Clone, Args)]
pub struct BenchArgs {
    /// Input graph file
    pub input: PathBuf,

    /// Worker threads
    #[arg(short, long, default_value_t = 1)]
    pub threads: usize,

    /// Input format (default: guessed from the file extension)
    #[arg(long, value_enum)]
    pub format: Option<InputFormat>,

    /// Append a JSON line describing the run to this file
    #[arg(long)]
    pub record: Option<PathBuf>,

    /// Skip hardware performance counters
    #[arg(long)]
    pub no_perf: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl BenchArgs {
    /// Format to load the input with
    #[must_use]
    pub fn graph_format(&self) -> GraphFormat {
        self.format
            .map_or_else(|| GraphFormat::from_path(&self.input), GraphFormat::from)
    }

    /// Measurement context honouring `--no-perf`
    #[must_use]
    pub fn measurement(&self) -> Measurement {
        Measurement::with_counters(!self.no_perf)
    }
}

/// Install the `tracing` subscriber; `RUST_LOG` overrides the verbosity flags
///
/// Logs go to stderr so stdout keeps only the result lines.
pub fn setup_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run an async I/O future to completion on a private current-thread runtime
///
/// # Errors
///
/// Returns error if the runtime cannot be built or the future fails
pub fn block_on<F, T>(future: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build I/O runtime")?
        .block_on(future)
}

/// Load the input graph and print the `Read N nodes, M edges` line
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed
pub fn load_input(args: &BenchArgs) -> Result<CsrGraph> {
    let format = args.graph_format();
    info!(path = %args.input.display(), ?format, "loading graph");
    let graph = block_on(load_graph(&args.input, format))
        .with_context(|| format!("Failed to load graph: {}", args.input.display()))?;
    println!("Read {} nodes, {} edges", graph.num_nodes(), graph.num_edges());
    Ok(graph)
}

/// Print the banner preceding the measured run
pub fn print_measured_banner() {
    println!("\n=== MEASURED RUN ===");
}

/// Print the run results and append the record when `--record` was given
///
/// # Errors
///
/// Returns error if the record file cannot be written
pub fn finish(args: &BenchArgs, sample: &Sample, record: &BenchmarkRecord) -> Result<()> {
    println!("time: {:.6} sec", sample.seconds());
    println!("{}", record.summary);

    if !sample.readings.is_empty() {
        eprint!("{}", perf_report(sample));
    }

    if let Some(path) = &args.record {
        block_on(record.append_jsonl(path))?;
        info!(path = %path.display(), "benchmark record appended");
    }
    Ok(())
}
