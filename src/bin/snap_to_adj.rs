//! Convert a SNAP edge list to PBBS adjacency text (or Parquet)
//!
//! Neighbor lists come out sorted; weights default to 1 and are written unless
//! `--no-weights` is given.
//!
//! # Examples
//!
//! ```bash
//! snap-to-adj soc-LiveJournal1.txt soc-LiveJournal1.adj
//! snap-to-adj com-orkut.ungraph.txt orkut.adj --symmetrize --no-weights
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use relax_bench::cli::{block_on, setup_logging};
use relax_bench::storage::{read_snap, write_adjacency, GraphFormat};
use std::path::PathBuf;
use tracing::info;

/// SNAP edge list to PBBS adjacency converter
#[derive(Parser)]
#[command(name = "snap-to-adj")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// SNAP edge list (`src dst` per line, `#` comments)
    input: PathBuf,

    /// Output file (`.parquet` writes a Parquet edge list)
    output: PathBuf,

    /// Write `AdjacencyGraph` without the weight section
    #[arg(long)]
    no_weights: bool,

    /// Add the reverse of every edge
    #[arg(long)]
    symmetrize: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    block_on(async {
        info!(path = %cli.input.display(), "reading SNAP edge list");
        let mut graph = read_snap(&cli.input)
            .await
            .with_context(|| format!("Failed to read {}", cli.input.display()))?;
        if cli.symmetrize {
            graph = graph.symmetrized()?;
        }
        println!("Vertices: {}, Edges: {}", graph.num_nodes(), graph.num_edges());

        info!(path = %cli.output.display(), "writing graph");
        match GraphFormat::from_path(&cli.output) {
            #[cfg(feature = "storage")]
            GraphFormat::Parquet => graph.write_parquet(&cli.output).await?,
            _ => write_adjacency(&graph, &cli.output, !cli.no_weights).await?,
        }
        println!("Done!");
        Ok(())
    })
}
