//! `javadepgraph` — builds a dependency graph out of a Java source tree
//!. Logging and CLI plumbing live here; the pipeline itself
//! never writes logs.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use javadepgraph::{output, pipeline};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "javadepgraph", version, about = "Static dependency graph builder for Java sources")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write nodes.jsonl / edges.jsonl / symbol_tables.json.
    Scan {
        /// Root of the Java source tree to analyze.
        path: PathBuf,
        #[arg(long, default_value = "out")]
        out: PathBuf,
    },
    /// Run the pipeline without writing output; print a summary only.
    Stats { path: PathBuf },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { path, out } => {
            info!(path = %path.display(), "starting scan");
            let result = pipeline::run(&path)?;
            output::write_all(&out, &result.graph, &result.symbol_table)?;
            info!(
                files = result.files_scanned,
                nodes = result.graph.nodes.len(),
                edges = result.graph.edges.len(),
                diagnostics = result.diagnostics.len(),
                "scan complete"
            );
            println!(
                "scanned {} files -> {} nodes, {} edges, {} diagnostics (written to {})",
                result.files_scanned,
                result.graph.nodes.len(),
                result.graph.edges.len(),
                result.diagnostics.len(),
                out.display()
            );
            for diag in &result.diagnostics {
                tracing::debug!(?diag, "diagnostic");
            }
        }
        Commands::Stats { path } => {
            info!(path = %path.display(), "starting dry-run scan");
            let result = pipeline::run(&path)?;
            println!(
                "{} files, {} nodes, {} edges, {} diagnostics",
                result.files_scanned,
                result.graph.nodes.len(),
                result.graph.edges.len(),
                result.diagnostics.len()
            );
        }
    }

    Ok(())
}
