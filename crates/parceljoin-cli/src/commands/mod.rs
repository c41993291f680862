//! Command implementations

mod build;
mod config;
mod inspect;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::Result;
use parceljoin_core::models::StageReport;
use tabled::Tabled;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Build(args) => build::execute(args, config_path, &output, cli.dry_run).await,
        Commands::Inspect(args) => inspect::execute(args, &output).await,
        Commands::Config => config::execute(config_path, &output),
    }
}

/// One counter of a stage report, for human tables
#[derive(Tabled)]
pub(crate) struct CounterRow {
    #[tabled(rename = "Stage")]
    pub stage: &'static str,
    #[tabled(rename = "Outcome")]
    pub outcome: String,
    #[tabled(rename = "Count")]
    pub count: usize,
}

/// Flatten a stage report into table rows, skipping zero counters
pub(crate) fn counter_rows(stage: &'static str, report: &StageReport) -> Vec<CounterRow> {
    let mut rows = vec![CounterRow { stage, outcome: "kept".to_string(), count: report.kept }];

    if report.filtered > 0 {
        rows.push(CounterRow { stage, outcome: "filtered".to_string(), count: report.filtered });
    }
    for (reason, count) in &report.skipped {
        rows.push(CounterRow { stage, outcome: format!("skipped: {}", reason), count: *count });
    }
    for (fallback, count) in &report.fallbacks {
        rows.push(CounterRow { stage, outcome: format!("fallback: {}", fallback), count: *count });
    }

    rows
}
