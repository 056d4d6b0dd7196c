//! Serialized shapes of the rollup artifacts.

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use super::synthesize::{AggregatedFeature, TimePoint};
use crate::config::{DataLayout, MetricKeys};
use crate::levels::GeographicLevel;

/// Names of the statistics each feature carries, published in the manifest.
pub static STATISTICAL_METHODS: [&str; 5] = ["average", "median", "max", "min", "count"];

/// A GeoJSON `FeatureCollection` of any serializable feature type.
#[derive(Serialize)]
pub struct FeatureCollection<F> {
    #[serde(rename = "type")]
    kind: &'static str,
    pub features: Vec<F>,
}

impl<F> FeatureCollection<F> {
    pub fn new(features: Vec<F>) -> Self {
        Self {
            kind: "FeatureCollection",
            features,
        }
    }
}

#[derive(Serialize)]
struct PolygonGeometry {
    #[serde(rename = "type")]
    kind: &'static str,
    coordinates: [[[f64; 2]; 5]; 1],
}

/// An aggregated feature rendered with the configured metric names.
pub struct PolygonFeature<'a> {
    pub feature: &'a AggregatedFeature,
    pub keys: &'a MetricKeys,
}

impl Serialize for PolygonFeature<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let geometry = PolygonGeometry {
            kind: "Polygon",
            coordinates: [self.feature.bounds.ring()],
        };
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("type", "Feature")?;
        map.serialize_entry("geometry", &geometry)?;
        map.serialize_entry("properties", &Properties(self))?;
        map.end()
    }
}

struct Properties<'a>(&'a PolygonFeature<'a>);

impl Serialize for Properties<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let f = self.0.feature;
        let keys = self.0.keys;
        let (a, b) = (&f.metric_a, &f.metric_b);

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("id", &f.id)?;
        map.serialize_entry("level", &f.level)?;
        map.serialize_entry("count", &f.count)?;
        map.serialize_entry(&format!("avg_{}", keys.a), &a.average)?;
        map.serialize_entry(&format!("avg_{}", keys.b), &b.average)?;
        map.serialize_entry(&format!("median_{}", keys.a), &a.median)?;
        map.serialize_entry(&format!("median_{}", keys.b), &b.median)?;
        map.serialize_entry(&format!("max_{}", keys.a), &a.max)?;
        map.serialize_entry(&format!("max_{}", keys.b), &b.max)?;
        map.serialize_entry(&format!("min_{}", keys.a), &a.min)?;
        map.serialize_entry(&format!("min_{}", keys.b), &b.min)?;
        if let Some(states) = &f.states {
            map.serialize_entry("states", states)?;
        }
        map.serialize_entry("timeValues", &TimeValues { points: &f.time_values, keys })?;
        map.end()
    }
}

struct TimeValues<'a> {
    points: &'a [TimePoint],
    keys: &'a MetricKeys,
}

impl Serialize for TimeValues<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.points.len()))?;
        for point in self.points {
            map.serialize_entry(point.label, &TimeValue { point, keys: self.keys })?;
        }
        map.end()
    }
}

struct TimeValue<'a> {
    point: &'a TimePoint,
    keys: &'a MetricKeys,
}

impl Serialize for TimeValue<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(&self.keys.a, &self.point.metric_a)?;
        map.serialize_entry(&self.keys.b, &self.point.metric_b)?;
        map.end()
    }
}

/// Per-level entry in the manifest.
#[derive(Debug, Serialize)]
pub struct LevelEntry {
    pub name: &'static str,
    pub zoom_threshold: u8,
    pub file: String,
}

impl LevelEntry {
    fn new(level: GeographicLevel, layout: &DataLayout) -> Self {
        Self {
            name: level.display_name(),
            zoom_threshold: level.zoom_threshold(),
            file: layout.level_file(level).display().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GeographicLevels {
    pub region: LevelEntry,
    pub state_region: LevelEntry,
    pub state: LevelEntry,
    pub zipcode: LevelEntry,
}

#[derive(Debug, Serialize)]
pub struct DataFiles {
    pub regions: String,
    pub state_regions: String,
    pub states: String,
    pub zipcodes: String,
}

/// Describes every artifact of a run for the map client, served as
/// `aggregated/config.json`.
#[derive(Debug, Serialize)]
pub struct Manifest {
    pub geographic_levels: GeographicLevels,
    pub statistical_methods: &'static [&'static str],
    pub data_files: DataFiles,
}

impl Manifest {
    pub fn new(layout: &DataLayout) -> Self {
        let file = |level| layout.level_file(level).display().to_string();
        Self {
            geographic_levels: GeographicLevels {
                region: LevelEntry::new(GeographicLevel::Region, layout),
                state_region: LevelEntry::new(GeographicLevel::StateRegion, layout),
                state: LevelEntry::new(GeographicLevel::State, layout),
                zipcode: LevelEntry::new(GeographicLevel::Zipcode, layout),
            },
            statistical_methods: &STATISTICAL_METHODS,
            data_files: DataFiles {
                regions: file(GeographicLevel::Region),
                state_regions: file(GeographicLevel::StateRegion),
                states: file(GeographicLevel::State),
                zipcodes: file(GeographicLevel::Zipcode),
            },
        }
    }
}
