use crate::anchors::AnchorTable;
use crate::config::GeneratorConfig;
use crate::types::{RegionAnchor, RegionKey, Sample};
use geo::Point;
use rand::Rng;
use std::f64::consts::TAU;
use tracing::{debug, info};

/// Generates heatmap samples for one region, or for every region when
/// `region` is `None`.
///
/// An unrecognised region yields no samples rather than an error, so a stale
/// or mistyped filter value simply renders an empty map.
pub fn generate_samples<R: Rng + ?Sized>(
    anchors: &AnchorTable,
    params: &GeneratorConfig,
    region: Option<&str>,
    rng: &mut R,
) -> Vec<Sample> {
    let samples: Vec<Sample> = match region {
        None => anchors
            .iter()
            .flat_map(|anchor| generate_region_samples(anchor, params, rng))
            .collect(),
        Some(raw) => match raw.parse::<RegionKey>() {
            Ok(key) => anchors
                .get(key)
                .map(|anchor| generate_region_samples(anchor, params, rng))
                .unwrap_or_default(),
            Err(e) => {
                debug!("{}, returning no samples", e);
                Vec::new()
            }
        },
    };

    info!(
        "Generated {} samples for {}",
        samples.len(),
        region.unwrap_or("all regions")
    );
    samples
}

pub fn generate_region_samples<R: Rng + ?Sized>(
    anchor: &RegionAnchor,
    params: &GeneratorConfig,
    rng: &mut R,
) -> Vec<Sample> {
    debug!(
        "Sampling {} points around {}",
        params.samples_per_region,
        anchor.region.display_name()
    );
    (0..params.samples_per_region)
        .map(|_| sample_around(anchor, params, rng))
        .collect()
}

fn sample_around<R: Rng + ?Sized>(
    anchor: &RegionAnchor,
    params: &GeneratorConfig,
    rng: &mut R,
) -> Sample {
    let angle = rng.gen::<f64>() * TAU;
    let distance = rng.gen::<f64>() * anchor.spread;

    // Equirectangular offset; longitude is stretched relative to latitude.
    let d_lat = distance * angle.sin() * params.lat_scale;
    let d_lng = distance * angle.cos() * params.lng_scale;

    let factor = distance_factor(d_lat, d_lng, anchor.spread, params.max_scale());
    let jitter = rng.gen::<f64>() * params.jitter_range;
    let raw = anchor.base_intensity + factor * params.distance_weight + jitter;

    Sample {
        point: Point::new(anchor.center.x() + d_lng, anchor.center.y() + d_lat),
        region: anchor.region,
        intensity: clamp_intensity(raw),
    }
}

/// Offset length relative to the widest reach of the spread, where `scale` is
/// the larger of the two axis scales. Lies in [0, 1] up to rounding.
pub fn distance_factor(d_lat: f64, d_lng: f64, spread: f64, scale: f64) -> f64 {
    let norm = spread * scale;
    if norm <= 0.0 {
        return 0.0;
    }
    d_lat.hypot(d_lng) / norm
}

pub fn clamp_intensity(raw: f64) -> f64 {
    if raw.is_nan() {
        0.0
    } else {
        raw.clamp(0.0, 1.0)
    }
}
