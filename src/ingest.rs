//! Zillow CSV ingestion.
//!
//! Zillow publishes ZHVI and ZORI as wide CSVs: a handful of metadata
//! columns (`RegionID`, `SizeRank`, `RegionName`, `StateName`, ...) followed
//! by one column per month headed with a date such as `2024-06-30`. This
//! module melts those into per-ZIP monthly series and exports the latest
//! month as the ZIP-level point collection the rollup reads.

use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, NaiveDate};
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;
use tracing::{info, instrument};

use crate::config::MetricKeys;
use crate::output::write_json;
use crate::record::PLACEHOLDER_POINT;

/// Column holding the ZIP code in Zillow ZIP-level exports.
pub const ZIP_COLUMN: &str = "RegionName";

/// Monthly values per ZIP code, keyed by the first day of each month.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlySeries {
    values: BTreeMap<String, BTreeMap<NaiveDate, f64>>,
}

fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

impl MonthlySeries {
    /// Melts a wide Zillow CSV. Header cells that are not `%Y-%m-%d` dates
    /// are metadata; empty or non-numeric cells are dropped.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers = rdr.headers()?.clone();

        let zip_idx = headers
            .iter()
            .position(|h| h == ZIP_COLUMN)
            .ok_or_else(|| anyhow!("missing `{ZIP_COLUMN}` column"))?;

        let month_cols: Vec<(usize, NaiveDate)> = headers
            .iter()
            .enumerate()
            .filter_map(|(idx, h)| {
                NaiveDate::parse_from_str(h.trim(), "%Y-%m-%d")
                    .ok()
                    .map(|d| (idx, month_start(d)))
            })
            .collect();

        let mut series = Self::default();
        for result in rdr.records() {
            let record = result?;
            let Some(zip) = record.get(zip_idx).map(str::trim).filter(|z| !z.is_empty()) else {
                continue;
            };
            let months = series.values.entry(zip.to_string()).or_default();
            for &(idx, month) in &month_cols {
                if let Some(value) = record.get(idx).and_then(|v| v.trim().parse::<f64>().ok()) {
                    months.insert(month, value);
                }
            }
        }

        Ok(series)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        Self::from_reader(file).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn latest_month(&self) -> Option<NaiveDate> {
        self.values
            .values()
            .filter_map(|months| months.keys().next_back().copied())
            .max()
    }

    pub fn value(&self, zip: &str, month: NaiveDate) -> Option<f64> {
        self.values.get(zip)?.get(&month).copied()
    }

    /// Number of (zip, month) observations.
    pub fn len(&self) -> usize {
        self.values.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn zips_at(&self, month: NaiveDate) -> impl Iterator<Item = &str> {
        self.values
            .iter()
            .filter(move |(_, months)| months.contains_key(&month))
            .map(|(zip, _)| zip.as_str())
    }
}

/// Builds the ZIP point collection for the latest month present in either
/// series. Every feature gets the placeholder geometry; coordinates are
/// resolved later.
pub fn latest_collection(a: &MonthlySeries, b: &MonthlySeries, keys: &MetricKeys) -> Option<Value> {
    let month = a.latest_month().max(b.latest_month())?;
    let zips: BTreeSet<&str> = a.zips_at(month).chain(b.zips_at(month)).collect();
    let date = month.format("%Y-%m").to_string();

    let features: Vec<Value> = zips
        .into_iter()
        .map(|zip| {
            let mut properties = serde_json::Map::new();
            properties.insert("zcta".into(), json!(zip));
            properties.insert(keys.a.clone(), json!(a.value(zip, month)));
            properties.insert(keys.b.clone(), json!(b.value(zip, month)));
            properties.insert("date".into(), json!(date));
            json!({
                "type": "Feature",
                "properties": properties,
                "geometry": { "type": "Point", "coordinates": PLACEHOLDER_POINT },
            })
        })
        .collect();

    Some(json!({ "type": "FeatureCollection", "features": features }))
}

/// Reads both wide CSVs and writes the latest-month collection to `out`.
/// Returns the number of features written.
#[instrument(skip(keys), fields(metric_a = %keys.a, metric_b = %keys.b))]
pub fn export_zips(a_csv: &Path, b_csv: &Path, out: &Path, keys: &MetricKeys) -> Result<usize> {
    let a = MonthlySeries::from_path(a_csv)?;
    info!(observations = a.len(), path = %a_csv.display(), "Loaded series");
    let b = MonthlySeries::from_path(b_csv)?;
    info!(observations = b.len(), path = %b_csv.display(), "Loaded series");

    let collection = latest_collection(&a, &b, keys)
        .ok_or_else(|| anyhow!("no monthly values in either input"))?;
    let count = collection["features"].as_array().map_or(0, Vec::len);

    write_json(out, &collection)?;
    info!(features = count, path = %out.display(), "Exported ZIP GeoJSON");
    Ok(count)
}
