use anyhow::{Context, Result, bail};
use serde_json::{Value, json};
use std::path::Path;
use tracing::{info, warn};

use super::CoordinateTable;
use crate::record::PLACEHOLDER_POINT;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub updated: usize,
    pub missing: usize,
}

/// Rewrites every feature's geometry in `collection` to a Point at the
/// table's coordinate for its `zcta`, or the placeholder when the table
/// has none. Properties are left untouched.
pub fn apply_to_value(collection: &mut Value, table: &CoordinateTable) -> Result<ApplyReport> {
    let Some(features) = collection.get_mut("features").and_then(Value::as_array_mut) else {
        bail!("not a FeatureCollection: missing `features` array");
    };

    let mut report = ApplyReport::default();
    for feature in features {
        let zip = match feature.pointer("/properties/zcta") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => continue,
        };

        let coordinates = match table.get(&zip) {
            Some(point) => {
                report.updated += 1;
                [point.lon, point.lat]
            }
            None => {
                report.missing += 1;
                PLACEHOLDER_POINT
            }
        };
        feature["geometry"] = json!({ "type": "Point", "coordinates": coordinates });
    }
    Ok(report)
}

/// Applies `table` to the collection stored at `path`, in place.
#[tracing::instrument(skip(table), fields(path = %path.display()))]
pub fn apply_coordinates(path: &Path, table: &CoordinateTable) -> Result<ApplyReport> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut collection: Value = serde_json::from_slice(&bytes)
        .with_context(|| format!("Invalid GeoJSON in {}", path.display()))?;

    let report = apply_to_value(&mut collection, table)?;

    std::fs::write(path, serde_json::to_string_pretty(&collection)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!(updated = report.updated, "Features updated with coordinates");
    if report.missing > 0 {
        warn!(missing = report.missing, "Features still using placeholder coordinates");
    }
    Ok(report)
}
