//! CA-BCM projection processing tool.
//!
//! Downloads yearly climate projection files and turns each into twelve
//! calendar-month rasters:
//! - Hydrological-year bands mapped to calendar months
//! - Reprojected to a geographic CRS (WGS84 by default)
//! - Clipped to a watershed boundary
//! - Intermediate files removed as the run progresses
//!
//! Failed (year, band) units are reported at the end; the exit status is
//! non-zero if any unit failed.

mod config;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use bcm_pipeline::{GdalCliEngine, HttpFetcher, Orchestrator, RunSummary};
use clap::Parser;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use config::{load_catalog, Cli, Command, RunArgs};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true);
    if cli.json_logs {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    let catalog = load_catalog(&cli.config_dir)?;

    match cli.command {
        Command::Datasets => {
            for dataset in catalog.iter() {
                println!("{:<10} {}", dataset.name(), dataset.description());
                println!("{:<10} {}", "", dataset.url_template());
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Run(args) => {
            let dataset = catalog.require(&args.dataset)?.clone();
            let summary = run(&args, dataset).await?;
            report(&summary);

            if let Some(path) = &args.summary_json {
                let json = serde_json::to_string_pretty(&summary)?;
                std::fs::write(path, json)
                    .with_context(|| format!("Failed to write summary to {}", path.display()))?;
                info!(path = %path.display(), "Wrote run summary");
            }

            Ok(if summary.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

async fn run(args: &RunArgs, dataset: bcm_pipeline::DatasetDescriptor) -> Result<RunSummary> {
    let config = args.run_config()?;

    if !config.boundary().exists() {
        warn!(
            boundary = %config.boundary().display(),
            "Boundary file not found, every clip will fail"
        );
    }

    let fetcher = Arc::new(HttpFetcher::new(args.fetch_config())?);
    let engine = Arc::new(GdalCliEngine::new(args.gdal_config()));
    let orchestrator = Orchestrator::new(config, dataset, fetcher, engine)?;

    info!(
        output_dir = %orchestrator.layout().output_dir().display(),
        "Starting projection run"
    );
    let summary = orchestrator.run().await.context("Pipeline run aborted")?;
    Ok(summary)
}

/// Log the outcome, enumerating every failed unit.
fn report(summary: &RunSummary) {
    info!(
        dataset = %summary.dataset,
        variable = %summary.variable,
        years = summary.years_processed,
        succeeded = summary.succeeded(),
        failed = summary.failed(),
        elapsed_secs = summary.elapsed.as_secs_f64(),
        "Projection run complete"
    );

    for failure in &summary.failures {
        error!(
            year = failure.unit.year,
            band = failure.unit.band,
            stage = %failure.stage,
            "{}",
            failure
        );
    }
}
