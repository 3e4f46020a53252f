//! Forecast verification extraction service.
//!
//! Loads a verification configuration, expands it into extraction jobs,
//! extracts every forecast and baseline field and writes CF-annotated
//! per-variable datasets plus a run summary under the work directory.

mod fetch;
mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use extraction::{ExtractionPlan, FieldExtractor, Normalizer, Orchestrator, UnitsTable, VxConfig};
use fetch::{FetchConfig, HttpFetcher};
use grib2_parser::Grib2Reader;

#[derive(Parser, Debug)]
#[command(name = "wxvx")]
#[command(about = "Forecast verification field extraction")]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "WXVX_CONFIG")]
    config: PathBuf,

    /// Worker count (overrides `threads` in the configuration)
    #[arg(long, env = "WXVX_THREADS")]
    threads: Option<usize>,

    /// Output root (overrides `workdir` in the configuration)
    #[arg(long, env = "WXVX_WORKDIR")]
    workdir: Option<PathBuf>,

    /// Print the expanded job list and exit
    #[arg(long)]
    list_jobs: bool,

    /// Maximum download retries for remote sources
    #[arg(long, env = "WXVX_MAX_RETRIES", default_value = "3")]
    max_retries: u32,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Load configuration
    let mut config = VxConfig::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    if let Some(workdir) = &args.workdir {
        config.workdir = workdir.clone();
    }

    let plan = ExtractionPlan::from_config(&config).context("Invalid verification plan")?;

    if args.list_jobs {
        for job in &plan.jobs {
            println!("{}", job);
        }
        return Ok(());
    }

    info!(
        config = %args.config.display(),
        workdir = %config.workdir.display(),
        threads = config.threads,
        "Starting verification extraction"
    );

    let fetcher = HttpFetcher::new(FetchConfig {
        max_retries: args.max_retries,
        ..FetchConfig::for_workdir(&config.workdir)
    })
    .context("Failed to create HTTP client")?;

    let extractor = FieldExtractor::new(Arc::new(Grib2Reader::standard()))
        .with_fetcher(Arc::new(fetcher));
    let normalizer = Normalizer::new(Arc::new(UnitsTable::standard()));

    let cancel = CancellationToken::new();
    let orchestrator =
        Orchestrator::new(extractor, normalizer, config.threads).with_cancellation(cancel.clone());

    // Ctrl-C stops scheduling new jobs; completed ones are still written.
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling remaining jobs");
            cancel.cancel();
        }
    });

    let outcome = orchestrator.run(&plan).await;

    let manifest = output::write_artifacts(&config.workdir, &outcome, config.plot.baseline)
        .await
        .context("Failed to write artifacts")?;

    let summary = &outcome.summary;
    for report in &summary.variables {
        info!(
            source = %report.source,
            variable = %report.variable,
            expected = report.expected,
            successes = report.successes,
            missing = report.missing,
            "Variable summary"
        );
    }

    info!(
        total = summary.total_jobs,
        succeeded = summary.succeeded,
        missing = summary.missing(),
        cancelled = summary.cancelled,
        manifest = %manifest.display(),
        "Verification extraction complete"
    );

    Ok(())
}
