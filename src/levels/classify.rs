use super::GeographicLevel;
use super::tables::{region_for, state_region_for};
use crate::record::ZipRecord;

/// Bucket id for records that match no table entry.
pub const OTHER: &str = "Other";

/// Where a record lands at one tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Bucket(String),
    /// Unresolved coordinates, or a ZIP too short to carry a state prefix.
    Skipped,
}

impl Classification {
    pub fn bucket_id(&self) -> Option<&str> {
        match self {
            Classification::Bucket(id) => Some(id),
            Classification::Skipped => None,
        }
    }
}

/// Maps a record to its bucket id at `level`.
///
/// Every tier requires coordinates. The state and state-region tiers also
/// need at least two characters of ZIP code. The zipcode tier buckets each
/// record under its own code.
pub fn classify(record: &ZipRecord, level: GeographicLevel) -> Classification {
    let Some(point) = record.coordinates else {
        return Classification::Skipped;
    };

    let id = match level {
        GeographicLevel::Region => region_for(point).map_or(OTHER, |r| r.name).to_string(),
        GeographicLevel::StateRegion => match record.state_code() {
            Some(code) => state_region_for(code).map_or(OTHER, |g| g.name).to_string(),
            None => return Classification::Skipped,
        },
        GeographicLevel::State => match record.state_code() {
            Some(code) => code.to_string(),
            None => return Classification::Skipped,
        },
        GeographicLevel::Zipcode => record.zip_code.clone(),
    };

    Classification::Bucket(id)
}
