//! ZIP-level input records.

use serde::{Deserialize, Serialize};

/// Point the Zillow export writes for every ZIP before real coordinates are
/// known (roughly the centre of the contiguous US), in `[lon, lat]` order.
pub const PLACEHOLDER_POINT: [f64; 2] = [-98.5795, 39.8283];

/// A latitude/longitude pair, serialized as `{"lat": .., "lon": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_placeholder(&self) -> bool {
        self.lon == PLACEHOLDER_POINT[0] && self.lat == PLACEHOLDER_POINT[1]
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

/// One ZIP code with its two metrics, as read from the source collection.
///
/// `coordinates` is `None` when neither the coordinate table nor the
/// feature geometry could place the ZIP.
#[derive(Debug, Clone, PartialEq)]
pub struct ZipRecord {
    pub zip_code: String,
    pub coordinates: Option<LatLon>,
    pub metric_a: Option<f64>,
    pub metric_b: Option<f64>,
}

impl ZipRecord {
    pub fn new(
        zip_code: impl Into<String>,
        coordinates: Option<LatLon>,
        metric_a: Option<f64>,
        metric_b: Option<f64>,
    ) -> Self {
        Self {
            zip_code: zip_code.into(),
            coordinates,
            metric_a,
            metric_b,
        }
    }

    /// First two characters of the ZIP code, or `None` if it is shorter.
    pub fn state_code(&self) -> Option<&str> {
        let mut chars = self.zip_code.char_indices();
        chars.next()?;
        let (idx, c) = chars.next()?;
        Some(&self.zip_code[..idx + c.len_utf8()])
    }
}
