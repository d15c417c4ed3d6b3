use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use petgraph::dot::{Config, Dot};
use rank_order::{read_relations, RelationGraph};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rank_order", about = "Sort keys by pairwise `a > b` relations", version)]
struct Cli {
    /// File with one `left > right` or `left < right` per line (stdin if omitted)
    input: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Fail on the first conflicting relation instead of skipping it
    #[arg(long)]
    strict: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Keys, comma separated
    Text,
    /// Order and relations as JSON
    Json,
    /// Relation edges in Graphviz DOT
    Dot,
    /// Every node with the identities of its direct relations
    Dump,
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
    Ok(())
}

fn build(reader: impl BufRead, strict: bool) -> Result<RelationGraph> {
    let mut graph = RelationGraph::new();
    for item in read_relations(reader) {
        let (line_no, relation) = item.context("failed to read relations")?;
        match graph.apply_relation(&relation.greater, &relation.lesser) {
            Ok(()) => {}
            Err(e) if e.is_conflict() && !strict => tracing::error!(line_no, "{e}"),
            Err(e) => return Err(e).with_context(|| format!("line {line_no}")),
        }
    }
    tracing::info!(keys = graph.len(), "relations applied");
    Ok(graph)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let reader: Box<dyn BufRead> = match &cli.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("could not open file: {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(io::stdin().lock()),
    };
    let graph = build(reader, cli.strict)?;

    let mut out = io::stdout().lock();
    match cli.format {
        Format::Text => {
            writeln!(out, "Done. Sorted list:")?;
            writeln!(out, "{}", graph.sorted_keys().join(", "))?;
        }
        Format::Json => {
            serde_json::to_writer_pretty(&mut out, &graph.snapshot())?;
            writeln!(out)?;
        }
        Format::Dot => {
            let digraph = graph.to_digraph();
            writeln!(out, "{:?}", Dot::with_config(&digraph, &[Config::EdgeNoLabel]))?;
        }
        Format::Dump => write!(out, "{graph}")?,
    }
    Ok(())
}
