//! File layout and metric naming shared by every subcommand.
//!
//! All artifacts live under one data directory:
//! ```text
//! <data_dir>/zip_latest.geojson
//! <data_dir>/zip_coordinates.json
//! <data_dir>/aggregated/regions.geojson
//! <data_dir>/aggregated/state_regions.geojson
//! <data_dir>/aggregated/states.geojson
//! <data_dir>/aggregated/config.json
//! ```

use anyhow::{Result, bail};
use std::path::{Path, PathBuf};

use crate::levels::GeographicLevel;

/// Environment variable consulted when no `--data-dir` is given.
pub const DATA_DIR_ENV: &str = "ZIP_ROLLUP_DATA_DIR";
pub const DEFAULT_DATA_DIR: &str = "data_demo";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    data_dir: PathBuf,
}

impl DataLayout {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Uses `explicit` if given, then `ZIP_ROLLUP_DATA_DIR`, then `data_demo`.
    pub fn resolve(explicit: Option<&str>) -> Self {
        let dir = match explicit {
            Some(dir) => dir.to_string(),
            None => std::env::var(DATA_DIR_ENV).unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string()),
        };
        Self::new(dir)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn zip_features(&self) -> PathBuf {
        self.data_dir.join("zip_latest.geojson")
    }

    pub fn coordinates(&self) -> PathBuf {
        self.data_dir.join("zip_coordinates.json")
    }

    pub fn aggregated_dir(&self) -> PathBuf {
        self.data_dir.join("aggregated")
    }

    pub fn manifest(&self) -> PathBuf {
        self.aggregated_dir().join("config.json")
    }

    /// Artifact path for a level. The zipcode level points at the source
    /// collection itself, since it is never aggregated.
    pub fn level_file(&self, level: GeographicLevel) -> PathBuf {
        match level {
            GeographicLevel::Zipcode => self.zip_features(),
            other => self.aggregated_dir().join(format!("{}.geojson", other.file_stem())),
        }
    }
}

/// Property names of the two metrics carried by every ZIP feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricKeys {
    pub a: String,
    pub b: String,
}

impl MetricKeys {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
        }
    }

    /// Like [`MetricKeys::new`], but rejects a pair that would collide in
    /// the `avg_*`/`median_*` properties and `timeValues` entries.
    pub fn distinct(a: impl Into<String>, b: impl Into<String>) -> Result<Self> {
        let keys = Self::new(a, b);
        if keys.a == keys.b {
            bail!("metric names must differ, got `{}` twice", keys.a);
        }
        Ok(keys)
    }
}

impl Default for MetricKeys {
    /// Zillow Home Value Index and Zillow Observed Rent Index.
    fn default() -> Self {
        Self::new("zhvi", "zori")
    }
}
