//! SectorMap CLI — one pipeline run over the requested segments.
//!
//! With no arguments both segments are loaded, merged, enriched and
//! upserted into the remote store. `--dry-run` swaps the remote store for an
//! in-memory one and prints the rows as JSON lines.

use anyhow::{Context, Result};
use clap::Parser;
use sectormap_core::data::{CircuitBreaker, KrxListingProvider, YahooPriceProvider};
use sectormap_core::domain::Segment;
use sectormap_core::store::{MemoryStore, RowStore, SupabaseStore};
use sectormap_runner::{credentials_from_env, Pipeline, RunReport, Settings};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "sectormap",
    about = "SectorMap — curated KOSPI200/KOSDAQ150 sectors with live caps and daily change"
)]
struct Cli {
    /// Path to a TOML settings file. Defaults to ./sectormap.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Segment to run (kospi200 or kosdaq150). Repeatable; defaults to both.
    #[arg(long = "segment")]
    segments: Vec<Segment>,

    /// Directory holding the curated CSV files.
    #[arg(long)]
    curated_dir: Option<PathBuf>,

    /// Publish into memory and print rows instead of calling the remote store.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sectormap=info")),
        )
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;
    if let Some(dir) = cli.curated_dir {
        settings.curated.dir = dir;
    }
    let segments = if cli.segments.is_empty() {
        Segment::ALL.to_vec()
    } else {
        cli.segments
    };

    tracing::info!(
        started_at = %chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        segments = ?segments,
        dry_run = cli.dry_run,
        "sectormap run started"
    );

    let report = if cli.dry_run {
        let store = MemoryStore::new();
        let report = run_pipeline(&settings, &segments, &store)?;
        for row in store.snapshot() {
            println!("{}", serde_json::to_string(&row)?);
        }
        report
    } else {
        let credentials = credentials_from_env()?;
        let store = SupabaseStore::new(
            credentials,
            settings.store.table.clone(),
            settings.store.on_conflict.clone(),
            settings.store.timeout(),
        )?;
        run_pipeline(&settings, &segments, &store)?
    };

    print_summary(&report);
    if !report.all_succeeded() {
        for err in report.failures() {
            eprintln!("Error: {err}");
        }
        std::process::exit(1);
    }

    Ok(())
}

fn run_pipeline(settings: &Settings, segments: &[Segment], store: &dyn RowStore) -> Result<RunReport> {
    let listing = KrxListingProvider::new(
        settings.listing.url.clone(),
        settings.listing.lookback_days,
        settings.listing.timeout(),
        settings.listing.retry(),
        Arc::new(CircuitBreaker::default_provider()),
    )?;
    let prices = YahooPriceProvider::new(
        settings.prices.url.clone(),
        settings.prices.timeout(),
        settings.prices.retry(),
        Arc::new(CircuitBreaker::default_provider()),
    )?;

    let pipeline = Pipeline::new(settings, &listing, &prices, store);
    Ok(pipeline.run(segments))
}

fn print_summary(report: &RunReport) {
    for (segment, result) in &report.segments {
        match result {
            Ok(r) => {
                tracing::info!(
                    segment = %segment,
                    curated = r.curated,
                    merged = r.merged,
                    changes = r.changes_resolved,
                    price_batches_failed = r.price_batches_failed,
                    rows = r.published.rows,
                    batches = r.published.batches,
                    degraded = r.is_degraded(),
                    "segment summary"
                );
                for d in &r.degradations {
                    tracing::warn!(segment = %segment, stage = d.stage, cause = %d.cause, "used defaults");
                }
            }
            Err(e) => tracing::error!(segment = %segment, error = %e, "segment summary"),
        }
    }
    tracing::info!(
        rows = report.rows_published(),
        ok = report.all_succeeded(),
        "sectormap run finished"
    );
}
