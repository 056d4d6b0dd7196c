//! Static lookup tables. Iteration order is declaration order, which is the
//! tie-break wherever two entries match.

use crate::record::LatLon;

/// A named region covering a closed latitude/longitude box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionBoundary {
    pub name: &'static str,
    pub lat_range: (f64, f64),
    pub lon_range: (f64, f64),
}

impl RegionBoundary {
    pub fn contains(&self, point: LatLon) -> bool {
        self.lat_range.0 <= point.lat
            && point.lat <= self.lat_range.1
            && self.lon_range.0 <= point.lon
            && point.lon <= self.lon_range.1
    }
}

/// A named group of two-digit state codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateRegionBoundary {
    pub name: &'static str,
    pub states: &'static [&'static str],
}

impl StateRegionBoundary {
    pub fn contains(&self, state_code: &str) -> bool {
        self.states.contains(&state_code)
    }
}

// The boxes overlap heavily (Pacific sits inside West); first match wins.
pub static REGIONS: [RegionBoundary; 7] = [
    RegionBoundary {
        name: "Northeast",
        lat_range: (40.0, 47.0),
        lon_range: (-80.0, -66.0),
    },
    RegionBoundary {
        name: "Southeast",
        lat_range: (24.0, 40.0),
        lon_range: (-87.0, -75.0),
    },
    RegionBoundary {
        name: "Midwest",
        lat_range: (36.0, 49.0),
        lon_range: (-104.0, -80.0),
    },
    RegionBoundary {
        name: "Southwest",
        lat_range: (31.0, 42.0),
        lon_range: (-120.0, -96.0),
    },
    RegionBoundary {
        name: "West",
        lat_range: (32.0, 49.0),
        lon_range: (-125.0, -102.0),
    },
    RegionBoundary {
        name: "Mountain",
        lat_range: (31.0, 49.0),
        lon_range: (-120.0, -102.0),
    },
    RegionBoundary {
        name: "Pacific",
        lat_range: (32.0, 49.0),
        lon_range: (-125.0, -116.0),
    },
];

// "27" is listed under both North Central groups.
pub static STATE_REGIONS: [StateRegionBoundary; 9] = [
    StateRegionBoundary {
        name: "New England",
        states: &["09", "23", "25", "33", "44", "50"],
    },
    StateRegionBoundary {
        name: "Mid-Atlantic",
        states: &["34", "36", "42"],
    },
    StateRegionBoundary {
        name: "South Atlantic",
        states: &["10", "11", "12", "13", "24", "37", "45", "51", "54"],
    },
    StateRegionBoundary {
        name: "East North Central",
        states: &["17", "18", "26", "27", "39", "55"],
    },
    StateRegionBoundary {
        name: "West North Central",
        states: &["19", "20", "27", "29", "31", "38", "46"],
    },
    StateRegionBoundary {
        name: "East South Central",
        states: &["01", "21", "28", "47"],
    },
    StateRegionBoundary {
        name: "West South Central",
        states: &["05", "22", "40", "48"],
    },
    StateRegionBoundary {
        name: "Mountain",
        states: &["04", "08", "16", "30", "32", "35", "49", "56"],
    },
    StateRegionBoundary {
        name: "Pacific",
        states: &["02", "06", "15", "41", "53"],
    },
];

/// First region whose box contains `point`.
pub fn region_for(point: LatLon) -> Option<&'static RegionBoundary> {
    REGIONS.iter().find(|r| r.contains(point))
}

/// First state-region whose list contains `state_code`.
pub fn state_region_for(state_code: &str) -> Option<&'static StateRegionBoundary> {
    STATE_REGIONS.iter().find(|g| g.contains(state_code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_is_closed_interval() {
        let ne = &REGIONS[0];
        assert!(ne.contains(LatLon::new(40.0, -80.0)));
        assert!(ne.contains(LatLon::new(47.0, -66.0)));
        assert!(!ne.contains(LatLon::new(47.01, -70.0)));
    }

    #[test]
    fn test_overlapping_boxes_prefer_declaration_order() {
        // Inside Midwest, Southwest, West, Mountain: Midwest is declared first.
        let r = region_for(LatLon::new(38.0, -103.0)).unwrap();
        assert_eq!(r.name, "Midwest");
        // Inside West and Pacific only.
        let r = region_for(LatLon::new(45.0, -123.0)).unwrap();
        assert_eq!(r.name, "West");
    }

    #[test]
    fn test_region_for_ocean_point() {
        assert!(region_for(LatLon::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn test_duplicate_state_code_resolves_to_first_group() {
        let g = state_region_for("27").unwrap();
        assert_eq!(g.name, "East North Central");
    }

    #[test]
    fn test_unknown_state_code() {
        assert!(state_region_for("99").is_none());
        assert!(state_region_for("03").is_none());
    }
}
