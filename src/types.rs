use geo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKey {
    Punjab,
    Sindh,
    Kpk,
    Balochistan,
}

impl RegionKey {
    pub const ALL: [RegionKey; 4] = [
        RegionKey::Punjab,
        RegionKey::Sindh,
        RegionKey::Kpk,
        RegionKey::Balochistan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RegionKey::Punjab => "punjab",
            RegionKey::Sindh => "sindh",
            RegionKey::Kpk => "kpk",
            RegionKey::Balochistan => "balochistan",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            RegionKey::Punjab => "Punjab",
            RegionKey::Sindh => "Sindh",
            RegionKey::Kpk => "Khyber Pakhtunkhwa",
            RegionKey::Balochistan => "Balochistan",
        }
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown region '{0}'")]
pub struct UnknownRegion(pub String);

impl FromStr for RegionKey {
    type Err = UnknownRegion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        RegionKey::ALL
            .into_iter()
            .find(|r| r.as_str() == key)
            .ok_or_else(|| UnknownRegion(s.to_string()))
    }
}

/// Fixed reference geography for one region. `center` is stored x = lon, y = lat.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionAnchor {
    pub region: RegionKey,
    pub center: Point<f64>,
    pub spread: f64,
    pub base_intensity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub point: Point<f64>,
    pub region: RegionKey,
    pub intensity: f64,
}

impl Sample {
    pub fn lat(&self) -> f64 {
        self.point.y()
    }

    pub fn lon(&self) -> f64 {
        self.point.x()
    }
}

/// Center and zoom handed to the map widget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapView {
    pub lat: f64,
    pub lon: f64,
    pub zoom: f64,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            lat: 30.3753,
            lon: 69.3451,
            zoom: 5.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_keys_parse_case_insensitively() {
        assert_eq!("Punjab".parse::<RegionKey>(), Ok(RegionKey::Punjab));
        assert_eq!(" KPK ".parse::<RegionKey>(), Ok(RegionKey::Kpk));
        assert_eq!(
            "gilgit".parse::<RegionKey>(),
            Err(UnknownRegion("gilgit".to_string()))
        );
    }

    #[test]
    fn region_key_round_trips_through_display() {
        for key in RegionKey::ALL {
            assert_eq!(key.to_string().parse::<RegionKey>(), Ok(key));
        }
    }
}
