//! Randomized test dataset: one region, two state-regions, six states, five
//! ZIP codes per state.
//!
//! ZIP codes are built from the state code (`23001`..`23005`) so the
//! prefix-based tiers see the intended states, and the anchors sit far enough
//! inside the Northeast box that ±0.5° of jitter never leaves it.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};
use tracing::info;

use crate::config::MetricKeys;
use crate::coordinates::CoordinateTable;
use crate::output::write_json;
use crate::record::{LatLon, ZipRecord};
use crate::rollup::{PaddingPolicy, RunOptions, RunReport, run};

pub const ZIPS_PER_STATE: usize = 5;
const JITTER: f64 = 0.5;

/// State code and anchor coordinate, grouped New England then Mid-Atlantic.
pub static TEST_STATES: [(&str, LatLon); 6] = [
    ("23", LatLon { lat: 44.5, lon: -69.0 }),
    ("25", LatLon { lat: 42.3, lon: -71.8 }),
    ("33", LatLon { lat: 43.5, lon: -71.5 }),
    ("34", LatLon { lat: 40.8, lon: -74.5 }),
    ("36", LatLon { lat: 42.5, lon: -75.0 }),
    ("42", LatLon { lat: 41.0, lon: -77.0 }),
];

/// Generates the test records. Metric values are whole numbers, as in the
/// published Zillow indices.
pub fn generate_records(rng: &mut impl Rng) -> Vec<ZipRecord> {
    let mut records = Vec::with_capacity(TEST_STATES.len() * ZIPS_PER_STATE);
    for (state, anchor) in &TEST_STATES {
        for i in 1..=ZIPS_PER_STATE {
            let point = LatLon::new(
                anchor.lat + rng.random_range(-JITTER..JITTER),
                anchor.lon + rng.random_range(-JITTER..JITTER),
            );
            let zhvi = rng.random_range(200_000.0..800_000.0_f64).round();
            let zori = rng.random_range(1_500.0..4_000.0_f64).round();
            records.push(ZipRecord::new(format!("{state}{i:03}"), Some(point), Some(zhvi), Some(zori)));
        }
    }
    records
}

/// The records as a point FeatureCollection in the source format.
pub fn to_collection(records: &[ZipRecord], keys: &MetricKeys) -> Value {
    let features: Vec<Value> = records
        .iter()
        .map(|r| {
            let mut properties = serde_json::Map::new();
            properties.insert("zcta".into(), json!(r.zip_code));
            properties.insert(keys.a.clone(), json!(r.metric_a));
            properties.insert(keys.b.clone(), json!(r.metric_b));
            properties.insert("date".into(), json!("2024-06"));
            let geometry = r
                .coordinates
                .map(|p| json!({ "type": "Point", "coordinates": [p.lon, p.lat] }));
            json!({ "type": "Feature", "properties": properties, "geometry": geometry })
        })
        .collect();
    json!({ "type": "FeatureCollection", "features": features })
}

fn to_table(records: &[ZipRecord]) -> CoordinateTable {
    let mut table = CoordinateTable::default();
    for r in records {
        if let Some(point) = r.coordinates {
            table.insert(r.zip_code.clone(), point);
        }
    }
    table
}

/// Writes the source collection and coordinate table, then runs the rollup
/// with test-dataset padding. `seed` makes the output reproducible.
#[tracing::instrument(skip(options))]
pub fn create_test_dataset(options: &RunOptions, seed: Option<u64>) -> Result<RunReport> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let records = generate_records(&mut rng);
    info!(records = records.len(), states = TEST_STATES.len(), "Generated test ZIP codes");

    let layout = &options.layout;
    write_json(&layout.zip_features(), &to_collection(&records, &options.keys))?;
    to_table(&records).save(&layout.coordinates())?;

    let options = RunOptions {
        padding: PaddingPolicy::TestDataset,
        ..options.clone()
    };
    Ok(run(&records, &options))
}
