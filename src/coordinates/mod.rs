//! ZIP coordinate lookup table and the sources that fill it.
//!
//! [`CoordinateTable`] is the side-channel `zip_coordinates.json` file.
//! [`CoordinateSource`] is the async trait for resolving ZIP codes.
//! [`ZipDatabase`] resolves from a bulk CSV download, [`Zippopotam`] one
//! ZIP at a time over HTTP.

mod apply;
mod database;
mod source;
mod zippopotam;

pub use apply::{ApplyReport, apply_coordinates};
pub use database::ZipDatabase;
pub use source::{CoordinateSource, fill_missing};
pub use zippopotam::Zippopotam;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::record::LatLon;

/// ZIP code → coordinate, stored on disk as
/// ```json
/// { "04001": { "lat": 43.52, "lon": -70.92 } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoordinateTable {
    entries: BTreeMap<String, LatLon>,
}

impl CoordinateTable {
    /// Loads the table at `path`. A missing file yields an empty table.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "Coordinate table not found, using feature geometry only");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read coordinate table {}", path.display()))?;
        let table: Self = serde_json::from_str(&content)
            .with_context(|| format!("Invalid coordinate table {}", path.display()))?;
        info!(path = %path.display(), entries = table.len(), "Coordinate table loaded");
        Ok(table)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(self)?;
        std::fs::write(path, body)
            .with_context(|| format!("Failed to write coordinate table {}", path.display()))?;
        debug!(path = %path.display(), entries = self.len(), "Coordinate table saved");
        Ok(())
    }

    pub fn get(&self, zip_code: &str) -> Option<LatLon> {
        self.entries.get(zip_code).copied()
    }

    pub fn contains(&self, zip_code: &str) -> bool {
        self.entries.contains_key(zip_code)
    }

    pub fn insert(&mut self, zip_code: impl Into<String>, point: LatLon) {
        self.entries.insert(zip_code.into(), point);
    }

    /// Adds entries from `other` for ZIPs not already present. Returns the
    /// number added.
    pub fn merge_missing(&mut self, other: CoordinateTable) -> usize {
        let mut added = 0;
        for (zip, point) in other.entries {
            if !self.entries.contains_key(&zip) {
                self.entries.insert(zip, point);
                added += 1;
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
