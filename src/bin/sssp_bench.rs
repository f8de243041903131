//! Delta-stepping SSSP benchmark driver
//!
//! # Examples
//!
//! ```bash
//! # 8 threads, delta = 2^13, source 0
//! sssp-bench road-USA.adj -t 8
//!
//! # Narrower buckets, check against Dijkstra, append a JSON record
//! sssp-bench road-USA.adj -t 8 --delta 10 --verify --record runs.jsonl
//! ```

use anyhow::{bail, Result};
use clap::Parser;
use relax_bench::cli::{finish, load_input, print_measured_banner, setup_logging, BenchArgs};
use relax_bench::kernels::sssp::{
    delta_step_with_state, dijkstra, SsspConfig, SsspState, DEFAULT_SHIFT,
};
use relax_bench::report::{BenchmarkRecord, SsspSummary, Summary};
use relax_bench::{Executor, GraphError};
use tracing::info;

/// Delta-stepping single-source shortest paths
#[derive(Parser)]
#[command(name = "sssp-bench")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    bench: BenchArgs,

    /// Bucket width exponent (delta = 2^shift)
    #[arg(long = "delta", default_value_t = DEFAULT_SHIFT)]
    shift: u32,

    /// Source vertex
    #[arg(short, long, default_value_t = 0)]
    source: u32,

    /// Compare distances with a sequential Dijkstra run
    #[arg(long)]
    verify: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.bench.verbose, cli.bench.quiet);

    // Counters first: the pool threads spawned below inherit them
    let mut measurement = cli.bench.measurement();

    // ============ INITIALIZATION PHASE (NOT MEASURED) ============
    let graph = load_input(&cli.bench)?;
    if cli.source as usize >= graph.num_nodes() {
        return Err(GraphError::VertexOutOfBounds {
            vertex: cli.source,
            num_nodes: graph.num_nodes(),
        }
        .into());
    }

    let exec = Executor::new(cli.bench.threads)?;
    let config = SsspConfig::new(cli.source).with_shift(cli.shift);
    let mut state = SsspState::new(graph.num_nodes());
    state.reset(config.source);

    println!(
        "INFO: Using delta-step of {}",
        1_u64.checked_shl(cli.shift).unwrap_or(u64::MAX)
    );
    println!("INFO: Using {} threads", exec.threads());

    // ============ MEASURED RUN (NO WARMUP) ============
    print_measured_banner();
    let (stats, sample) =
        measurement.measure(|| delta_step_with_state(&exec, &graph, &config, &state));
    let stats = stats?;
    info!(
        rounds = stats.rounds,
        relaxations = stats.relaxations,
        stale = stats.stale_items,
        "sssp finished"
    );

    let distances = state.into_distances();
    let summary = SsspSummary::from_distances(&distances);
    let record = BenchmarkRecord::new(
        "sssp",
        &cli.bench.input,
        (graph.num_nodes(), graph.num_edges()),
        exec.threads(),
        &sample,
        Summary::Sssp(summary),
    )
    .with_param("source", cli.source)
    .with_param("shift", cli.shift)
    .with_param("rounds", stats.rounds)
    .with_param("relaxations", stats.relaxations);
    finish(&cli.bench, &sample, &record)?;

    if cli.verify {
        let expected = dijkstra(&graph, cli.source);
        let mismatches = expected
            .iter()
            .zip(&distances)
            .filter(|(a, b)| a != b)
            .count();
        if mismatches > 0 {
            bail!("verification failed: {mismatches} distances differ from Dijkstra");
        }
        println!("verification: OK");
    }

    Ok(())
}
