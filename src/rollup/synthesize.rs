//! Turns a filled [`Bucket`] into the values published for it.

use super::bucket::Bucket;
use super::utility::{max, median, min};
use crate::levels::GeographicLevel;
use crate::record::LatLon;

/// Month labels and multipliers of the synthetic trend. The last entry is
/// the current month. These are a display placeholder, not history.
pub static TIME_SERIES: [(&str, f64); 6] = [
    ("2024-01", 0.95),
    ("2024-02", 0.97),
    ("2024-03", 0.99),
    ("2024-04", 1.01),
    ("2024-05", 1.03),
    ("2024-06", 1.00),
];

/// How far the published rectangle extends past the centroid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaddingPolicy {
    /// Full dataset: at least 0.5° or 10% of the spread.
    #[default]
    Full,
    /// Reduced test dataset: at least 0.2° or 20% of the spread.
    TestDataset,
}

impl PaddingPolicy {
    pub fn floor(&self) -> f64 {
        match self {
            PaddingPolicy::Full => 0.5,
            PaddingPolicy::TestDataset => 0.2,
        }
    }

    pub fn factor(&self) -> f64 {
        match self {
            PaddingPolicy::Full => 0.1,
            PaddingPolicy::TestDataset => 0.2,
        }
    }

    pub fn padding(&self, axis_range: f64) -> f64 {
        self.floor().max(axis_range * self.factor())
    }
}

/// Average, median, max and min of one metric in one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MetricSummary {
    pub average: f64,
    pub median: f64,
    pub max: f64,
    pub min: f64,
}

impl MetricSummary {
    fn compute(total: f64, count: usize, values: &[f64]) -> Self {
        Self {
            average: if count == 0 { 0.0 } else { total / count as f64 },
            median: median(values),
            max: max(values),
            min: min(values),
        }
    }
}

/// One labelled point of the synthetic trend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimePoint {
    pub label: &'static str,
    pub metric_a: f64,
    pub metric_b: f64,
}

/// Axis-aligned rectangle in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Rect {
    /// Closed exterior ring in `[lon, lat]` order, counter-clockwise from
    /// the south-west corner.
    pub fn ring(&self) -> [[f64; 2]; 5] {
        [
            [self.west, self.south],
            [self.east, self.south],
            [self.east, self.north],
            [self.west, self.north],
            [self.west, self.south],
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedFeature {
    pub id: String,
    pub level: GeographicLevel,
    pub count: usize,
    pub centroid: LatLon,
    pub bounds: Rect,
    pub metric_a: MetricSummary,
    pub metric_b: MetricSummary,
    /// Sorted state codes; `Some` only at the state-region tier.
    pub states: Option<Vec<String>>,
    pub time_values: Vec<TimePoint>,
}

/// Builds the published feature for a bucket, or `None` if the bucket never
/// received a coordinate.
pub fn synthesize(
    id: &str,
    level: GeographicLevel,
    bucket: &Bucket,
    padding: PaddingPolicy,
) -> Option<AggregatedFeature> {
    let n = bucket.coordinates.len();
    if n == 0 {
        return None;
    }

    let lat_sum: f64 = bucket.coordinates.iter().map(|c| c.lat).sum();
    let lon_sum: f64 = bucket.coordinates.iter().map(|c| c.lon).sum();
    let centroid = LatLon::new(lat_sum / n as f64, lon_sum / n as f64);

    let lats: Vec<f64> = bucket.coordinates.iter().map(|c| c.lat).collect();
    let lons: Vec<f64> = bucket.coordinates.iter().map(|c| c.lon).collect();
    let lat_pad = padding.padding(max(&lats) - min(&lats));
    let lon_pad = padding.padding(max(&lons) - min(&lons));

    let bounds = Rect {
        west: centroid.lon - lon_pad,
        south: centroid.lat - lat_pad,
        east: centroid.lon + lon_pad,
        north: centroid.lat + lat_pad,
    };

    let metric_a = MetricSummary::compute(bucket.total_a, bucket.count, &bucket.values_a);
    let metric_b = MetricSummary::compute(bucket.total_b, bucket.count, &bucket.values_b);

    let time_values = TIME_SERIES
        .iter()
        .map(|&(label, multiplier)| TimePoint {
            label,
            metric_a: metric_a.average * multiplier,
            metric_b: metric_b.average * multiplier,
        })
        .collect();

    let states = (level == GeographicLevel::StateRegion)
        .then(|| bucket.states.iter().cloned().collect());

    Some(AggregatedFeature {
        id: id.to_string(),
        level,
        count: bucket.count,
        centroid,
        bounds,
        metric_a,
        metric_b,
        states,
        time_values,
    })
}
