use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use zip_rollup::config::{DataLayout, MetricKeys};
use zip_rollup::levels::GeographicLevel;
use zip_rollup::rollup::{PaddingPolicy, RunOptions, run_from_files};
use zip_rollup::testdata::create_test_dataset;

fn point_feature(zip: &str, lon: f64, lat: f64, zhvi: Value, zori: Value) -> Value {
    json!({
        "type": "Feature",
        "properties": { "zcta": zip, "zhvi": zhvi, "zori": zori, "date": "2024-06" },
        "geometry": { "type": "Point", "coordinates": [lon, lat] }
    })
}

fn write_source(layout: &DataLayout, features: Vec<Value>) {
    fs::create_dir_all(layout.data_dir()).unwrap();
    let collection = json!({ "type": "FeatureCollection", "features": features });
    fs::write(layout.zip_features(), serde_json::to_vec(&collection).unwrap()).unwrap();
}

fn options(dir: &Path) -> RunOptions {
    RunOptions {
        layout: DataLayout::new(dir),
        keys: MetricKeys::default(),
        padding: PaddingPolicy::Full,
    }
}

fn read(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn features_of(layout: &DataLayout, level: GeographicLevel) -> Vec<Value> {
    read(&layout.level_file(level))["features"]
        .as_array()
        .unwrap()
        .clone()
}

/// Three ZIPs in Maine (23xxx) and three in New York (36xxx), all inside the
/// Northeast box.
fn northeast_sample() -> Vec<Value> {
    vec![
        point_feature("23001", -69.0, 44.0, json!(300000), json!(1800)),
        point_feature("23002", -69.5, 44.5, json!(320000), json!(1900)),
        point_feature("23003", -70.0, 43.8, json!(340000), json!(null)),
        point_feature("36001", -74.0, 41.0, json!(500000), json!(2500)),
        point_feature("36002", -74.5, 42.0, json!(550000), json!(2600)),
        point_feature("36003", -75.0, 42.5, json!(null), json!(2700)),
    ]
}

#[test]
fn test_end_to_end_northeast() {
    let dir = tempfile::tempdir().unwrap();
    let options = options(dir.path());
    write_source(&options.layout, northeast_sample());

    let report = run_from_files(&options).unwrap();
    assert!(!report.failed());
    assert_eq!(report.records, 6);

    let regions = features_of(&options.layout, GeographicLevel::Region);
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0]["properties"]["id"], "Northeast");
    assert_eq!(regions[0]["properties"]["count"], 6);
    assert_eq!(regions[0]["properties"]["level"], "region");

    let state_regions = features_of(&options.layout, GeographicLevel::StateRegion);
    assert_eq!(state_regions.len(), 2);
    let total: u64 = state_regions
        .iter()
        .map(|f| f["properties"]["count"].as_u64().unwrap())
        .sum();
    assert_eq!(total, 6);
    let new_england = state_regions
        .iter()
        .find(|f| f["properties"]["id"] == "New England")
        .unwrap();
    assert_eq!(new_england["properties"]["states"], json!(["23"]));

    let states = features_of(&options.layout, GeographicLevel::State);
    assert_eq!(states.len(), 2);
    for state in &states {
        assert_eq!(state["properties"]["count"], 3);
        assert!(state["properties"].get("states").is_none());
    }

    let maine = states.iter().find(|f| f["properties"]["id"] == "23").unwrap();
    let props = &maine["properties"];
    assert_eq!(props["avg_zhvi"], 320000.0);
    assert_eq!(props["median_zhvi"], 320000.0);
    // The missing rent counts as zero in the average but not in the median.
    assert_eq!(props["avg_zori"], (1800.0 + 1900.0) / 3.0);
    assert_eq!(props["median_zori"], 1800.0);
    assert_eq!(props["max_zori"], 1900.0);
    assert_eq!(props["timeValues"]["2024-06"]["zhvi"], props["avg_zhvi"]);

    let ring = maine["geometry"]["coordinates"][0].as_array().unwrap();
    assert_eq!(ring.len(), 5);
    assert_eq!(ring[0], ring[4]);
}

#[test]
fn test_manifest_lists_levels_and_files() {
    let dir = tempfile::tempdir().unwrap();
    let options = options(dir.path());
    write_source(&options.layout, northeast_sample());
    run_from_files(&options).unwrap();

    let manifest = read(&options.layout.manifest());
    assert_eq!(manifest["geographic_levels"]["state_region"]["zoom_threshold"], 6);
    assert_eq!(manifest["geographic_levels"]["state"]["zoom_threshold"], 8);
    assert_eq!(
        manifest["statistical_methods"],
        json!(["average", "median", "max", "min", "count"])
    );
    let regions_file = manifest["data_files"]["regions"].as_str().unwrap();
    assert!(Path::new(regions_file).exists());
}

#[test]
fn test_rerun_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let options = options(dir.path());
    write_source(&options.layout, northeast_sample());

    let snapshot = |layout: &DataLayout| -> Vec<Vec<u8>> {
        GeographicLevel::AGGREGATED
            .iter()
            .map(|&l| layout.level_file(l))
            .chain(std::iter::once(layout.manifest()))
            .map(|p| fs::read(p).unwrap())
            .collect()
    };

    run_from_files(&options).unwrap();
    let first = snapshot(&options.layout);
    run_from_files(&options).unwrap();
    let second = snapshot(&options.layout);

    assert_eq!(first, second);
}

#[test]
fn test_one_character_zip_only_reaches_region() {
    let dir = tempfile::tempdir().unwrap();
    let options = options(dir.path());
    write_source(
        &options.layout,
        vec![
            point_feature("23001", -69.0, 44.0, json!(300000), json!(1800)),
            point_feature("5", -69.2, 44.1, json!(100000), json!(900)),
        ],
    );

    let report = run_from_files(&options).unwrap();

    let regions = features_of(&options.layout, GeographicLevel::Region);
    assert_eq!(regions[0]["properties"]["count"], 2);

    for level in [GeographicLevel::StateRegion, GeographicLevel::State] {
        let counted: u64 = features_of(&options.layout, level)
            .iter()
            .map(|f| f["properties"]["count"].as_u64().unwrap())
            .sum();
        assert_eq!(counted, 1, "{level}");
        let level_report = report.levels.iter().find(|l| l.level == level).unwrap();
        assert_eq!(level_report.skipped, 1);
    }
}

#[test]
fn test_coordinate_table_resolves_placeholder_geometry() {
    let dir = tempfile::tempdir().unwrap();
    let options = options(dir.path());
    write_source(
        &options.layout,
        vec![
            point_feature("23001", -98.5795, 39.8283, json!(300000), json!(1800)),
            point_feature("36001", -98.5795, 39.8283, json!(500000), json!(2500)),
        ],
    );
    fs::write(
        options.layout.coordinates(),
        r#"{"23001": {"lat": 44.0, "lon": -69.0}}"#,
    )
    .unwrap();

    let report = run_from_files(&options).unwrap();

    let regions = features_of(&options.layout, GeographicLevel::Region);
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0]["properties"]["count"], 1);
    assert_eq!(report.levels[0].skipped, 1);
}

#[test]
fn test_missing_input_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let options = options(dir.path());

    assert!(run_from_files(&options).is_err());
    assert!(!options.layout.aggregated_dir().exists());
}

#[test]
fn test_seeded_test_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let options = options(dir.path());

    let report = create_test_dataset(&options, Some(42)).unwrap();
    assert!(!report.failed());
    assert_eq!(report.records, 30);

    assert_eq!(features_of(&options.layout, GeographicLevel::Region).len(), 1);
    assert_eq!(features_of(&options.layout, GeographicLevel::StateRegion).len(), 2);
    assert_eq!(features_of(&options.layout, GeographicLevel::State).len(), 6);
    assert!(options.layout.coordinates().exists());

    // The generated source collection feeds the regular pipeline too.
    let rerun = run_from_files(&options).unwrap();
    assert_eq!(rerun.records, 30);
    assert_eq!(rerun.levels.iter().map(|l| l.skipped).sum::<usize>(), 0);
}
