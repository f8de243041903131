//! `PageRank` benchmark driver
//!
//! # Examples
//!
//! ```bash
//! pr-bench twitter.adj -t 16 --rounds 10
//! ```

use anyhow::Result;
use clap::Parser;
use relax_bench::cli::{finish, load_input, print_measured_banner, setup_logging, BenchArgs};
use relax_bench::kernels::pagerank::{
    pagerank_with_state, PrConfig, PrState, DAMPING_FACTOR, DEFAULT_MAX_ROUNDS, EPSILON,
};
use relax_bench::report::{BenchmarkRecord, PrSummary, Summary};
use relax_bench::Executor;
use tracing::info;

/// `PageRank` with a per-round frontier
#[derive(Parser)]
#[command(name = "pr-bench")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    bench: BenchArgs,

    /// Round cap
    #[arg(long, default_value_t = DEFAULT_MAX_ROUNDS)]
    rounds: u32,

    /// Per-vertex change that keeps a vertex active
    #[arg(long, default_value_t = EPSILON)]
    epsilon: f32,

    /// Damping factor
    #[arg(long, default_value_t = DAMPING_FACTOR)]
    damping: f32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.bench.verbose, cli.bench.quiet);

    let mut measurement = cli.bench.measurement();

    // ============ INITIALIZATION PHASE (NOT MEASURED) ============
    let graph = load_input(&cli.bench)?;
    let exec = Executor::new(cli.bench.threads)?;
    let config = PrConfig {
        damping: cli.damping,
        epsilon: cli.epsilon,
        max_rounds: cli.rounds,
    };
    let mut state = PrState::new(graph.num_nodes());
    println!("INFO: Using {} threads", exec.threads());

    // ============ MEASURED RUN (NO WARMUP) ============
    print_measured_banner();
    let (active_per_round, sample) =
        measurement.measure(|| pagerank_with_state(&exec, &graph, &config, &mut state));
    info!(rounds = active_per_round.len(), ?active_per_round, "pagerank finished");

    let summary = PrSummary::from_ranks(&state.ranks());
    let record = BenchmarkRecord::new(
        "pr",
        &cli.bench.input,
        (graph.num_nodes(), graph.num_edges()),
        exec.threads(),
        &sample,
        Summary::Pr(summary),
    )
    .with_param("max_rounds", cli.rounds)
    .with_param("epsilon", cli.epsilon)
    .with_param("damping", cli.damping)
    .with_param("rounds", active_per_round.len())
    .with_param("active_per_round", active_per_round);
    finish(&cli.bench, &sample, &record)
}
