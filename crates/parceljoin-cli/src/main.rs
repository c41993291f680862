//! Parceljoin CLI - Command-line interface
//!
//! Runs the footprint-to-parcel enrichment pipeline and inspects its inputs.

mod cli;
mod commands;
mod config;
mod dry_run;
mod output;
mod output_types;
mod progress;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use output::OutputWriter;

fn main() -> Result<()> {
    // Logs go to stderr so `--json` output on stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = cli.json;

    let runtime = tokio::runtime::Runtime::new()?;

    if let Err(e) = runtime.block_on(async { commands::execute(cli).await }) {
        OutputWriter::new(json).error(format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
