use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::levels::{Classification, GeographicLevel, classify};
use crate::record::{LatLon, ZipRecord};

/// Running totals for one named group at one tier.
///
/// Sums treat a missing metric as zero while `values_*` keep only the
/// values that were present, so a bucket with gaps reports a lower average
/// than its median/max/min would suggest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bucket {
    pub count: usize,
    pub total_a: f64,
    pub total_b: f64,
    pub values_a: Vec<f64>,
    pub values_b: Vec<f64>,
    pub coordinates: Vec<LatLon>,
    /// Contributing state codes; only filled at the state-region tier.
    pub states: BTreeSet<String>,
}

impl Bucket {
    fn add(&mut self, record: &ZipRecord, point: LatLon) {
        self.count += 1;
        self.total_a += record.metric_a.unwrap_or(0.0);
        self.total_b += record.metric_b.unwrap_or(0.0);
        self.values_a.extend(record.metric_a);
        self.values_b.extend(record.metric_b);
        self.coordinates.push(point);
    }
}

/// Buckets for one tier plus the number of records that landed nowhere.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationResult {
    pub buckets: BTreeMap<String, Bucket>,
    pub skipped: usize,
}

impl AggregationResult {
    /// Records placed into some bucket, `"Other"` included.
    pub fn bucketed(&self) -> usize {
        self.buckets.values().map(|b| b.count).sum()
    }
}

/// Buckets every record at `level`.
pub fn aggregate(records: &[ZipRecord], level: GeographicLevel) -> AggregationResult {
    let mut result = AggregationResult::default();

    for record in records {
        let (id, point) = match (classify(record, level), record.coordinates) {
            (Classification::Bucket(id), Some(point)) => (id, point),
            _ => {
                debug!(zip = %record.zip_code, %level, "Record skipped");
                result.skipped += 1;
                continue;
            }
        };

        let bucket = result.buckets.entry(id).or_default();
        bucket.add(record, point);

        if level == GeographicLevel::StateRegion {
            if let Some(code) = record.state_code() {
                bucket.states.insert(code.to_string());
            }
        }
    }

    result
}
