use crate::config::{AnchorConfig, GeneratorConfig};
use crate::types::{RegionAnchor, RegionKey};
use geo::Point;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AnchorError {
    #[error("anchor table is empty")]
    Empty,

    #[error("unknown region '{0}' in anchor table")]
    UnknownRegion(String),

    #[error("duplicate anchor for region '{0}'")]
    Duplicate(RegionKey),

    #[error("no anchor configured for region '{0}'")]
    Missing(RegionKey),

    #[error("anchor '{region}' has invalid center ({lat}, {lon})")]
    InvalidCenter { region: RegionKey, lat: f64, lon: f64 },

    #[error("anchor '{region}' has invalid spread {spread}")]
    InvalidSpread { region: RegionKey, spread: f64 },

    #[error("samples around '{region}' would reach ({lat}, {lon}), outside valid coordinates")]
    SpreadOutOfBounds { region: RegionKey, lat: f64, lon: f64 },

    #[error("anchor '{region}' base intensity {value} is outside [0, 1]")]
    InvalidBaseIntensity { region: RegionKey, value: f64 },
}

// Anchor centers indexed for nearest-region lookups.
struct CenterIndex {
    index: usize,
    center: [f64; 2],
}

impl RTreeObject for CenterIndex {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.center)
    }
}

impl PointDistance for CenterIndex {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.center[0] - point[0];
        let dy = self.center[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Immutable set of region anchors, one per [`RegionKey`].
///
/// Construction validates the whole table; a table that fails validation is
/// never handed out, so generation can rely on every region being present with
/// finite geometry whose samples stay on valid coordinates.
pub struct AnchorTable {
    anchors: Vec<RegionAnchor>,
    tree: RTree<CenterIndex>,
}

impl AnchorTable {
    pub fn new(anchors: Vec<RegionAnchor>, params: &GeneratorConfig) -> Result<Self, AnchorError> {
        if anchors.is_empty() {
            return Err(AnchorError::Empty);
        }

        for (i, anchor) in anchors.iter().enumerate() {
            validate(anchor, params)?;
            if anchors[..i].iter().any(|a| a.region == anchor.region) {
                return Err(AnchorError::Duplicate(anchor.region));
            }
        }

        if let Some(missing) = RegionKey::ALL
            .into_iter()
            .find(|key| !anchors.iter().any(|a| a.region == *key))
        {
            return Err(AnchorError::Missing(missing));
        }

        let tree = RTree::bulk_load(
            anchors
                .iter()
                .enumerate()
                .map(|(index, a)| CenterIndex {
                    index,
                    center: [a.center.x(), a.center.y()],
                })
                .collect(),
        );

        Ok(Self { anchors, tree })
    }

    pub fn from_config(
        configs: &[AnchorConfig],
        params: &GeneratorConfig,
    ) -> Result<Self, AnchorError> {
        let anchors = configs
            .iter()
            .map(|c| {
                let region = c
                    .region
                    .parse::<RegionKey>()
                    .map_err(|e| AnchorError::UnknownRegion(e.0))?;
                Ok(RegionAnchor {
                    region,
                    center: Point::new(c.lon, c.lat),
                    spread: c.spread,
                    base_intensity: c.base_intensity,
                })
            })
            .collect::<Result<Vec<_>, AnchorError>>()?;
        Self::new(anchors, params)
    }

    pub fn get(&self, region: RegionKey) -> Option<&RegionAnchor> {
        self.anchors.iter().find(|a| a.region == region)
    }

    /// Anchors in table order.
    pub fn iter(&self) -> impl Iterator<Item = &RegionAnchor> {
        self.anchors.iter()
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Region whose anchor center is closest to the given coordinate.
    pub fn nearest_region(&self, lat: f64, lon: f64) -> Option<RegionKey> {
        if !lat.is_finite() || !lon.is_finite() {
            return None;
        }
        self.tree
            .nearest_neighbor(&[lon, lat])
            .and_then(|c| self.anchors.get(c.index))
            .map(|a| a.region)
    }
}

fn validate(anchor: &RegionAnchor, params: &GeneratorConfig) -> Result<(), AnchorError> {
    let (lat, lon) = (anchor.center.y(), anchor.center.x());
    if !lat.is_finite() || !lon.is_finite() || lat.abs() > 90.0 || lon.abs() > 180.0 {
        return Err(AnchorError::InvalidCenter {
            region: anchor.region,
            lat,
            lon,
        });
    }
    if !anchor.spread.is_finite() || anchor.spread < 0.0 {
        return Err(AnchorError::InvalidSpread {
            region: anchor.region,
            spread: anchor.spread,
        });
    }
    let reach_lat = lat.abs() + anchor.spread * params.lat_scale.abs();
    let reach_lon = lon.abs() + anchor.spread * params.lng_scale.abs();
    if !reach_lat.is_finite() || !reach_lon.is_finite() || reach_lat > 90.0 || reach_lon > 180.0 {
        return Err(AnchorError::SpreadOutOfBounds {
            region: anchor.region,
            lat: reach_lat.copysign(lat),
            lon: reach_lon.copysign(lon),
        });
    }
    if !(0.0..=1.0).contains(&anchor.base_intensity) {
        return Err(AnchorError::InvalidBaseIntensity {
            region: anchor.region,
            value: anchor.base_intensity,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_anchors;

    fn configs() -> Vec<AnchorConfig> {
        default_anchors()
    }

    fn build(c: &[AnchorConfig]) -> Result<AnchorTable, AnchorError> {
        AnchorTable::from_config(c, &GeneratorConfig::default())
    }

    #[test]
    fn default_table_is_valid() {
        let table = build(&configs()).unwrap();
        assert_eq!(table.len(), 4);
        let punjab = table.get(RegionKey::Punjab).unwrap();
        assert_eq!(punjab.center, Point::new(72.7097, 31.1704));
        assert_eq!(punjab.base_intensity, 0.21);
    }

    #[test]
    fn iteration_follows_table_order() {
        let table = build(&configs()).unwrap();
        let order: Vec<_> = table.iter().map(|a| a.region).collect();
        assert_eq!(order, RegionKey::ALL.to_vec());
    }

    #[test]
    fn rejects_empty_table() {
        assert_eq!(
            AnchorTable::new(Vec::new(), &GeneratorConfig::default()).err(),
            Some(AnchorError::Empty)
        );
    }

    #[test]
    fn rejects_unknown_region() {
        let mut c = configs();
        c[0].region = "gilgit".to_string();
        assert_eq!(
            build(&c).err(),
            Some(AnchorError::UnknownRegion("gilgit".to_string()))
        );
    }

    #[test]
    fn rejects_duplicate_region() {
        let mut c = configs();
        c[3].region = "sindh".to_string();
        assert_eq!(
            build(&c).err(),
            Some(AnchorError::Duplicate(RegionKey::Sindh))
        );
    }

    #[test]
    fn rejects_missing_region() {
        let mut c = configs();
        c.pop();
        assert_eq!(
            build(&c).err(),
            Some(AnchorError::Missing(RegionKey::Balochistan))
        );
    }

    #[test]
    fn rejects_bad_geometry() {
        let mut c = configs();
        c[1].lat = 95.0;
        assert!(matches!(
            build(&c),
            Err(AnchorError::InvalidCenter { region: RegionKey::Sindh, .. })
        ));

        let mut c = configs();
        c[2].lon = f64::NAN;
        assert!(matches!(
            build(&c),
            Err(AnchorError::InvalidCenter { region: RegionKey::Kpk, .. })
        ));

        let mut c = configs();
        c[0].spread = -1.0;
        assert!(matches!(
            build(&c),
            Err(AnchorError::InvalidSpread { region: RegionKey::Punjab, .. })
        ));

        let mut c = configs();
        c[0].spread = f64::INFINITY;
        assert!(matches!(
            build(&c),
            Err(AnchorError::InvalidSpread { .. })
        ));
    }

    #[test]
    fn rejects_base_intensity_out_of_range() {
        let mut c = configs();
        c[3].base_intensity = 1.2;
        assert!(matches!(
            build(&c),
            Err(AnchorError::InvalidBaseIntensity { region: RegionKey::Balochistan, .. })
        ));
    }

    #[test]
    fn rejects_spread_reaching_past_the_pole() {
        let mut c = configs();
        c[2].lat = 89.0;
        c[2].spread = 200.0;
        assert!(matches!(
            build(&c),
            Err(AnchorError::SpreadOutOfBounds { region: RegionKey::Kpk, .. })
        ));

        // Same anchor fits once the latitude scale is small enough.
        let narrow = GeneratorConfig {
            lat_scale: 0.001,
            ..GeneratorConfig::default()
        };
        assert!(AnchorTable::from_config(&c, &narrow).is_ok());
    }

    #[test]
    fn rejects_spread_reaching_past_the_antimeridian() {
        let mut c = configs();
        c[0].lon = 179.0;
        c[0].spread = 100.0;
        assert!(matches!(
            build(&c),
            Err(AnchorError::SpreadOutOfBounds { region: RegionKey::Punjab, .. })
        ));
    }

    #[test]
    fn zero_spread_is_allowed() {
        let mut c = configs();
        c[0].spread = 0.0;
        assert!(build(&c).is_ok());
    }

    #[test]
    fn nearest_region_picks_the_closest_center() {
        let table = build(&configs()).unwrap();
        // Lahore, Karachi, Peshawar, Quetta
        assert_eq!(table.nearest_region(31.5204, 74.3587), Some(RegionKey::Punjab));
        assert_eq!(table.nearest_region(24.8607, 67.0011), Some(RegionKey::Sindh));
        assert_eq!(table.nearest_region(34.0151, 71.5249), Some(RegionKey::Kpk));
        assert_eq!(table.nearest_region(30.1798, 66.9750), Some(RegionKey::Balochistan));
        assert_eq!(table.nearest_region(f64::NAN, 70.0), None);
    }
}
