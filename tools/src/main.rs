//! retention-runner: headless retention analysis for a ledger snapshot.
//!
//! Usage:
//!   retention-runner --ledger ledger.json --roster roster.json --reference 2024-01-01T00:00:00Z
//!   retention-runner --seed 12345 --customers 1000 --output report.json

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use retention_core::{
    config::RetentionConfig,
    generator::DatasetGenerator,
    ledger::InputTables,
    pipeline::{AnalysisReport, RetentionPipeline},
    types::RunId,
};
use std::path::PathBuf;

/// Score churn risk and build an ROI-ranked retention action plan.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Ledger JSON (array of transactions). Requires --roster.
    #[arg(long, requires = "roster")]
    ledger: Option<PathBuf>,

    /// Roster JSON (array of {customer_id, segment}).
    #[arg(long, requires = "ledger")]
    roster: Option<PathBuf>,

    /// Seed for the synthetic dataset, used when no ledger is given.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Override the profile's customer count for synthetic data.
    #[arg(long)]
    customers: Option<usize>,

    /// Reference instant (RFC 3339). Defaults to the profile end date.
    #[arg(long)]
    reference: Option<DateTime<Utc>>,

    /// Directory holding rules/ and generator/ config files.
    /// Built-in defaults are used when omitted.
    #[arg(long)]
    data_dir: Option<String>,

    /// Write the JSON report here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write the generated ledger/roster under this directory.
    #[arg(long)]
    emit_dataset: Option<PathBuf>,
}

#[derive(serde::Serialize)]
struct RunOutput<'a> {
    run_id: RunId,
    #[serde(flatten)]
    report: &'a AnalysisReport,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.data_dir {
        Some(dir) => RetentionConfig::load(dir)?,
        None => RetentionConfig::default(),
    };
    if let Some(n) = args.customers {
        config.dataset.num_customers = n;
    }

    let (tables, default_reference) = match (&args.ledger, &args.roster) {
        (Some(ledger), Some(roster)) => (InputTables::load(ledger, roster)?, None),
        _ => {
            let generator = DatasetGenerator::new(config.dataset.clone(), args.seed)?;
            let tables = generator.generate()?;
            if let Some(dir) = &args.emit_dataset {
                tables.write_json(dir)?;
                log::info!("Wrote generated dataset to {}", dir.display());
            }
            (tables, Some(generator.end_instant()))
        }
    };

    let reference = args
        .reference
        .or(default_reference)
        .context("--reference is required when reading a ledger from disk")?;

    let run_id: RunId = format!("run-{}", uuid::Uuid::new_v4());
    log::info!("{run_id}: reference={reference} ledger_rows={}", tables.ledger.len());

    let pipeline = RetentionPipeline::new(&config)?;
    let report = pipeline.run(&tables, reference)?;
    log_summary(&run_id, &report);

    let json = serde_json::to_string_pretty(&RunOutput {
        run_id,
        report: &report,
    })?;
    match &args.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("Cannot write {}", path.display()))?,
        None => println!("{json}"),
    }

    Ok(())
}

fn log_summary(run_id: &str, report: &AnalysisReport) {
    let s = &report.summary;
    log::info!(
        "{run_id}: at_risk={} revenue_at_risk={:.2} cost={:.2} savings={:.2} roi={:?}",
        s.total_customers_at_risk,
        s.total_revenue_at_risk,
        s.intervention_cost,
        s.potential_savings,
        s.roi,
    );
    for (rank, entry) in s.top_3_actions.iter().enumerate() {
        log::info!(
            "{run_id}: #{} {} | {} | cost={:.2} roi={:.1}%",
            rank + 1,
            entry.recommendation.segment_label,
            entry.recommendation.action,
            entry.recommendation.estimated_cost,
            entry.roi,
        );
    }
    for skipped in &report.action_plan.skipped {
        log::warn!("{run_id}: skipped {}: {}", skipped.segment_label, skipped.reason);
    }
}
