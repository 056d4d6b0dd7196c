use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info, warn};

use super::bucket::aggregate;
use super::synthesize::{AggregatedFeature, PaddingPolicy, synthesize};
use super::types::{FeatureCollection, Manifest, PolygonFeature};
use crate::config::{DataLayout, MetricKeys};
use crate::coordinates::CoordinateTable;
use crate::error::{Result, RollupError};
use crate::levels::GeographicLevel;
use crate::output::write_json;
use crate::parser::{load_collection, to_records};
use crate::record::ZipRecord;

/// Everything a rollup run needs besides its records.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub layout: DataLayout,
    pub keys: MetricKeys,
    pub padding: PaddingPolicy,
}

/// Features for one tier plus the tallies behind them.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelOutput {
    pub level: GeographicLevel,
    pub features: Vec<AggregatedFeature>,
    pub skipped: usize,
    pub empty_buckets: usize,
}

/// What happened to one tier during a run.
#[derive(Debug, Clone, Serialize)]
pub struct LevelReport {
    pub level: GeographicLevel,
    pub path: PathBuf,
    pub features: usize,
    pub skipped: usize,
    pub empty_buckets: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub records: usize,
    pub levels: Vec<LevelReport>,
    pub manifest_error: Option<String>,
}

impl RunReport {
    pub fn failed(&self) -> bool {
        self.manifest_error.is_some() || self.levels.iter().any(|l| l.error.is_some())
    }
}

/// Aggregates and synthesizes one tier. Pure: identical input gives
/// identical output.
pub fn build_level(records: &[ZipRecord], level: GeographicLevel, padding: PaddingPolicy) -> LevelOutput {
    let result = aggregate(records, level);
    let mut features = Vec::with_capacity(result.buckets.len());
    let mut empty_buckets = 0;

    for (id, bucket) in &result.buckets {
        match synthesize(id, level, bucket, padding) {
            Some(feature) => features.push(feature),
            None => empty_buckets += 1,
        }
    }

    LevelOutput {
        level,
        features,
        skipped: result.skipped,
        empty_buckets,
    }
}

fn write_level(output: &LevelOutput, options: &RunOptions) -> Result<PathBuf> {
    let path = options.layout.level_file(output.level);
    let collection = FeatureCollection::new(
        output
            .features
            .iter()
            .map(|feature| PolygonFeature {
                feature,
                keys: &options.keys,
            })
            .collect(),
    );
    write_json(&path, &collection)?;
    Ok(path)
}

/// Builds and writes every aggregated tier, then the manifest.
///
/// A failing tier is logged and recorded; the remaining tiers and the
/// manifest are still attempted.
#[tracing::instrument(skip_all, fields(records = records.len(), padding = ?options.padding))]
pub fn run(records: &[ZipRecord], options: &RunOptions) -> RunReport {
    let mut levels = Vec::new();

    for level in GeographicLevel::AGGREGATED {
        let output = build_level(records, level, options.padding);
        let path = options.layout.level_file(level);

        let error = match write_level(&output, options) {
            Ok(_) => {
                info!(
                    %level,
                    features = output.features.len(),
                    skipped = output.skipped,
                    path = %path.display(),
                    "Level written"
                );
                None
            }
            Err(e) => {
                error!(%level, error = %e, "Level failed");
                Some(e.to_string())
            }
        };

        levels.push(LevelReport {
            level,
            path,
            features: output.features.len(),
            skipped: output.skipped,
            empty_buckets: output.empty_buckets,
            error,
        });
    }

    let manifest_path = options.layout.manifest();
    let manifest_error = match write_json(&manifest_path, &Manifest::new(&options.layout)) {
        Ok(()) => {
            info!(path = %manifest_path.display(), "Manifest written");
            None
        }
        Err(e) => {
            error!(error = %e, "Manifest failed");
            Some(e.to_string())
        }
    };

    RunReport {
        records: records.len(),
        levels,
        manifest_error,
    }
}

/// Loads the source collection and coordinate table named by the layout and
/// runs every tier.
///
/// # Errors
///
/// Fails before writing anything if the source collection is missing or
/// invalid, or the coordinate table exists but cannot be parsed.
pub fn run_from_files(options: &RunOptions) -> Result<RunReport> {
    let source_path = options.layout.zip_features();
    let collection = load_collection(&source_path)?;
    info!(features = collection.features.len(), path = %source_path.display(), "Loaded ZIP features");

    let table_path = options.layout.coordinates();
    let table = CoordinateTable::load(&table_path).map_err(|e| RollupError::InvalidInput {
        path: table_path.clone(),
        reason: format!("{e:#}"),
    })?;

    let records = to_records(&collection, &options.keys, &table);
    let unresolved = records.iter().filter(|r| r.coordinates.is_none()).count();
    if unresolved > 0 {
        warn!(unresolved, "Records without coordinates will be skipped");
    }

    Ok(run(&records, options))
}
