//! Parser for the ZIP-level source FeatureCollection.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

use crate::config::MetricKeys;
use crate::coordinates::CoordinateTable;
use crate::error::{Result, RollupError};
use crate::record::{LatLon, ZipRecord};

#[derive(Debug, Deserialize)]
pub struct SourceCollection {
    pub features: Vec<SourceFeature>,
}

#[derive(Debug, Deserialize)]
pub struct SourceFeature {
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub geometry: Option<Value>,
}

impl SourceFeature {
    /// The `zcta` property coerced to a string. Numbers keep their JSON
    /// rendering, so a ZIP exported as `1001` stays four characters long.
    pub fn zip_code(&self) -> String {
        match self.properties.get("zcta") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }

    /// A numeric property, or `None` if it is missing, null or not a number.
    pub fn metric(&self, key: &str) -> Option<f64> {
        self.properties.get(key).and_then(Value::as_f64)
    }

    /// The Point geometry as a coordinate, ignoring the export placeholder.
    pub fn point(&self) -> Option<LatLon> {
        let geometry = self.geometry.as_ref()?;
        if geometry.get("type").and_then(Value::as_str) != Some("Point") {
            return None;
        }
        let coords = geometry.get("coordinates")?.as_array()?;
        let lon = coords.first()?.as_f64()?;
        let lat = coords.get(1)?.as_f64()?;
        let point = LatLon::new(lat, lon);
        (point.is_finite() && !point.is_placeholder()).then_some(point)
    }
}

/// Decodes a FeatureCollection from raw bytes.
pub fn parse_collection(bytes: &[u8]) -> serde_json::Result<SourceCollection> {
    serde_json::from_slice(bytes)
}

/// Converts source features into records. A finite coordinate table entry
/// wins over the feature's own geometry.
pub fn to_records(
    collection: &SourceCollection,
    keys: &MetricKeys,
    table: &CoordinateTable,
) -> Vec<ZipRecord> {
    collection
        .features
        .iter()
        .map(|feature| {
            let zip_code = feature.zip_code();
            let coordinates = table
                .get(&zip_code)
                .filter(LatLon::is_finite)
                .or_else(|| feature.point());
            ZipRecord {
                coordinates,
                metric_a: feature.metric(&keys.a),
                metric_b: feature.metric(&keys.b),
                zip_code,
            }
        })
        .collect()
}

/// Reads the source collection at `path`.
///
/// # Errors
///
/// [`RollupError::InputMissing`] if the file cannot be read and
/// [`RollupError::InvalidInput`] if it is not a FeatureCollection.
pub fn load_collection(path: &Path) -> Result<SourceCollection> {
    let bytes = std::fs::read(path).map_err(|source| RollupError::InputMissing {
        path: path.to_path_buf(),
        source,
    })?;
    parse_collection(&bytes).map_err(|e| RollupError::InvalidInput {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature",
             "properties": {"zcta": "23001", "zhvi": 350000, "zori": null},
             "geometry": {"type": "Point", "coordinates": [-69.5, 44.2]}},
            {"type": "Feature",
             "properties": {"zcta": 1001, "zhvi": 280000.5, "zori": 1900},
             "geometry": {"type": "Point", "coordinates": [-98.5795, 39.8283]}},
            {"type": "Feature",
             "properties": {"zhvi": "n/a"},
             "geometry": null}
        ]
    }"#;

    #[test]
    fn test_parse_sample() {
        let collection = parse_collection(SAMPLE.as_bytes()).unwrap();
        assert_eq!(collection.features.len(), 3);

        let records = to_records(&collection, &MetricKeys::default(), &CoordinateTable::default());
        assert_eq!(records[0].zip_code, "23001");
        assert_eq!(records[0].coordinates, Some(LatLon::new(44.2, -69.5)));
        assert_eq!(records[0].metric_a, Some(350000.0));
        assert_eq!(records[0].metric_b, None);

        assert_eq!(records[1].zip_code, "1001");
        assert_eq!(records[1].coordinates, None, "placeholder point is unresolved");
        assert_eq!(records[1].metric_b, Some(1900.0));

        assert_eq!(records[2].zip_code, "");
        assert_eq!(records[2].metric_a, None);
        assert_eq!(records[2].coordinates, None);
    }

    #[test]
    fn test_coordinate_table_overrides_geometry() {
        let collection = parse_collection(SAMPLE.as_bytes()).unwrap();
        let mut table = CoordinateTable::default();
        table.insert("1001", LatLon::new(42.06, -72.61));
        table.insert("23001", LatLon::new(43.9, -70.1));

        let records = to_records(&collection, &MetricKeys::default(), &table);
        assert_eq!(records[0].coordinates, Some(LatLon::new(43.9, -70.1)));
        assert_eq!(records[1].coordinates, Some(LatLon::new(42.06, -72.61)));
    }

    #[test]
    fn test_non_finite_table_entry_falls_back_to_geometry() {
        let collection = parse_collection(SAMPLE.as_bytes()).unwrap();
        let mut table = CoordinateTable::default();
        table.insert("23001", LatLon::new(f64::NAN, -70.1));
        table.insert("1001", LatLon::new(42.06, f64::INFINITY));

        let records = to_records(&collection, &MetricKeys::default(), &table);
        assert_eq!(records[0].coordinates, Some(LatLon::new(44.2, -69.5)));
        assert_eq!(records[1].coordinates, None);
    }

    #[test]
    fn test_parse_invalid_bytes() {
        assert!(parse_collection(b"{\"type\": \"Feature\"}").is_err());
        assert!(parse_collection(&[0xFF, 0xFE]).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_collection(Path::new("/nonexistent/zip_latest.geojson")).unwrap_err();
        assert!(matches!(err, RollupError::InputMissing { .. }));
    }
}
