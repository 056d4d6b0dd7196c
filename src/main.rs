//! CLI entry point for the ZIP market rollup tool.
//!
//! Provides subcommands for exporting Zillow CSVs to a ZIP point collection,
//! resolving ZIP coordinates, rolling ZIPs up into region / state-region /
//! state tiers, and generating a small randomized test dataset.

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use zip_rollup::config::{DataLayout, MetricKeys};
use zip_rollup::coordinates::{
    CoordinateSource, CoordinateTable, ZipDatabase, Zippopotam, apply_coordinates, fill_missing,
};
use zip_rollup::fetch::BasicClient;
use zip_rollup::ingest::export_zips;
use zip_rollup::levels::GeographicLevel;
use zip_rollup::output::print_json;
use zip_rollup::parser::load_collection;
use zip_rollup::rollup::{PaddingPolicy, RunOptions, RunReport, run_from_files};
use zip_rollup::testdata::create_test_dataset;

#[derive(Parser)]
#[command(name = "zip_rollup")]
#[command(about = "Roll Zillow ZIP-level metrics up into map-ready GeoJSON tiers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct CommonArgs {
    /// Data directory (falls back to ZIP_ROLLUP_DATA_DIR, then "data_demo")
    #[arg(short = 'd', long)]
    data_dir: Option<String>,

    /// Property name of the first metric
    #[arg(long, default_value = "zhvi")]
    metric_a: String,

    /// Property name of the second metric
    #[arg(long, default_value = "zori")]
    metric_b: String,
}

impl CommonArgs {
    fn layout(&self) -> DataLayout {
        DataLayout::resolve(self.data_dir.as_deref())
    }

    fn keys(&self) -> Result<MetricKeys> {
        MetricKeys::distinct(&self.metric_a, &self.metric_b)
    }

    fn run_options(&self, padding: PaddingPolicy) -> Result<RunOptions> {
        Ok(RunOptions {
            layout: self.layout(),
            keys: self.keys()?,
            padding,
        })
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceKind {
    /// Bulk ZIP code database CSV, downloaded once
    Database,
    /// Per-ZIP lookups against api.zippopotam.us
    Zippopotam,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate ZIP features into region, state-region and state GeoJSON
    Aggregate {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Generate a randomized 30-ZIP test dataset and aggregate it
    TestDataset {
        #[command(flatten)]
        common: CommonArgs,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Resolve coordinates for ZIP codes missing from the coordinate table
    FetchCoordinates {
        #[command(flatten)]
        common: CommonArgs,

        /// Where to look coordinates up
        #[arg(short, long, value_enum, default_value_t = SourceKind::Database)]
        source: SourceKind,

        /// Maximum number of concurrent per-ZIP lookups
        #[arg(short, long, default_value_t = 5)]
        concurrency: usize,
    },
    /// Rewrite ZIP feature geometry from the coordinate table
    ApplyCoordinates {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Export the latest month of two Zillow wide CSVs as ZIP features
    ExportZips {
        #[command(flatten)]
        common: CommonArgs,

        /// Wide CSV for the first metric
        #[arg(long, default_value = "data_raw/zhvi.csv")]
        metric_a_csv: PathBuf,

        /// Wide CSV for the second metric
        #[arg(long, default_value = "data_raw/zori.csv")]
        metric_b_csv: PathBuf,
    },
    /// Show which tier the map client displays at a zoom level
    Zoom {
        #[arg(value_name = "ZOOM")]
        zoom: u8,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/zip_rollup.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("zip_rollup.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive(LevelFilter::INFO.into()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive(LevelFilter::DEBUG.into()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Aggregate { common } => {
            let report = run_from_files(&common.run_options(PaddingPolicy::Full)?)?;
            finish(&report)?;
        }
        Commands::TestDataset { common, seed } => {
            let report = create_test_dataset(&common.run_options(PaddingPolicy::TestDataset)?, seed)?;
            finish(&report)?;
        }
        Commands::FetchCoordinates {
            common,
            source,
            concurrency,
        } => {
            let layout = common.layout();
            let client = BasicClient::new()?;
            match source {
                SourceKind::Database => fetch_coordinates(&ZipDatabase::new(client), &layout).await?,
                SourceKind::Zippopotam => {
                    fetch_coordinates(&Zippopotam::new(client, concurrency), &layout).await?
                }
            }
        }
        Commands::ApplyCoordinates { common } => {
            let layout = common.layout();
            let table = CoordinateTable::load(&layout.coordinates())?;
            if table.is_empty() {
                bail!(
                    "no coordinates in {}; run fetch-coordinates first",
                    layout.coordinates().display()
                );
            }
            apply_coordinates(&layout.zip_features(), &table)?;
        }
        Commands::ExportZips {
            common,
            metric_a_csv,
            metric_b_csv,
        } => {
            let layout = common.layout();
            export_zips(&metric_a_csv, &metric_b_csv, &layout.zip_features(), &common.keys()?)?;
        }
        Commands::Zoom { zoom } => {
            let level = GeographicLevel::for_zoom(zoom);
            info!(
                zoom,
                tier = %level,
                label = level.display_name(),
                threshold = level.zoom_threshold(),
                "Tier for zoom"
            );
        }
    }

    Ok(())
}

/// Loads the ZIP codes of the source collection and fills the coordinate
/// table from `source`.
#[tracing::instrument(skip_all, fields(source = source.name()))]
async fn fetch_coordinates<S: CoordinateSource + Sync>(source: &S, layout: &DataLayout) -> Result<()> {
    let collection = load_collection(&layout.zip_features())?;
    let zip_codes: Vec<String> = collection
        .features
        .iter()
        .map(|f| f.zip_code())
        .filter(|z| !z.is_empty())
        .collect();
    info!(zip_codes = zip_codes.len(), "ZIP codes to check");

    let path = layout.coordinates();
    let mut table = CoordinateTable::load(&path)?;
    fill_missing(source, &mut table, &zip_codes, &path).await?;
    Ok(())
}

/// Logs the run summary and turns any per-level failure into a non-zero exit.
fn finish(report: &RunReport) -> Result<()> {
    print_json(report)?;

    let failed: Vec<String> = report
        .levels
        .iter()
        .filter(|l| l.error.is_some())
        .map(|l| l.level.to_string())
        .collect();

    if let Some(e) = &report.manifest_error {
        warn!(error = %e, "Manifest was not written");
    }
    if report.failed() {
        bail!("rollup finished with failures: levels {:?}", failed);
    }

    info!(levels = report.levels.len(), "Rollup complete");
    Ok(())
}
