use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;
#[allow(unused)]
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "quartiles=warn";

/// Report latency percentiles of the `Duration: <ns>` lines in a text stream.
///
/// Every other line is echoed to stdout unchanged.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Read from this file instead of stdin
    input: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();
    let stdout = io::stdout();
    let output = BufWriter::new(stdout.lock());

    let report = match &cli.input {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("Failed to open {path:?}"))?;
            quartiles::aggregate(BufReader::new(file), output)?
        }
        None => quartiles::aggregate(io::stdin().lock(), output)?,
    };
    debug!("Aggregated {} samples", report.count);

    Ok(())
}
