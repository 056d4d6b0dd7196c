//! Geographic tiers and the static tables used to bucket ZIP codes into them.
//!
//! [`GeographicLevel`] lists the tiers coarse to fine. [`tables`] holds the
//! region boxes and state-region groups. [`classify`] maps one record to its
//! bucket at one tier.

pub mod classify;
pub mod tables;

use serde::Serialize;
use std::fmt;

pub use classify::{Classification, OTHER, classify};

/// One granularity of geographic rollup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeographicLevel {
    Region,
    StateRegion,
    State,
    Zipcode,
}

impl GeographicLevel {
    /// All tiers, coarse to fine.
    pub const ALL: [GeographicLevel; 4] = [
        GeographicLevel::Region,
        GeographicLevel::StateRegion,
        GeographicLevel::State,
        GeographicLevel::Zipcode,
    ];

    /// Tiers that are rolled up from ZIP records.
    pub const AGGREGATED: [GeographicLevel; 3] = [
        GeographicLevel::Region,
        GeographicLevel::StateRegion,
        GeographicLevel::State,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GeographicLevel::Region => "region",
            GeographicLevel::StateRegion => "state_region",
            GeographicLevel::State => "state",
            GeographicLevel::Zipcode => "zipcode",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            GeographicLevel::Region => "Region",
            GeographicLevel::StateRegion => "State Region",
            GeographicLevel::State => "State",
            GeographicLevel::Zipcode => "ZIP Code",
        }
    }

    /// Highest map zoom at which the client shows this tier.
    pub fn zoom_threshold(&self) -> u8 {
        match self {
            GeographicLevel::Region => 4,
            GeographicLevel::StateRegion => 6,
            GeographicLevel::State => 8,
            GeographicLevel::Zipcode => 10,
        }
    }

    pub fn file_stem(&self) -> &'static str {
        match self {
            GeographicLevel::Region => "regions",
            GeographicLevel::StateRegion => "state_regions",
            GeographicLevel::State => "states",
            GeographicLevel::Zipcode => "zipcodes",
        }
    }

    /// First tier whose threshold covers `zoom`; anything past the last
    /// threshold falls back to the ZIP tier.
    pub fn for_zoom(zoom: u8) -> GeographicLevel {
        Self::ALL
            .into_iter()
            .find(|level| zoom <= level.zoom_threshold())
            .unwrap_or(GeographicLevel::Zipcode)
    }
}

impl fmt::Display for GeographicLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
