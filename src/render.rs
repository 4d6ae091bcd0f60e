use crate::types::Sample;
use anyhow::{anyhow, Context, Result};
use geo::{BoundingRect, Coord, MultiPoint, Point, Rect};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};
use image::{ImageBuffer, Rgba, RgbaImage};
use rayon::prelude::*;
use std::f64::consts::PI;
use std::fs;
use std::path::Path;
use tracing::info;

// Heat colour ramp: transparent green for no density through to solid red.
const RAMP: [(f64, [f64; 4]); 6] = [
    (0.0, [0.0, 255.0, 0.0, 0.0]),
    (0.2, [150.0, 255.0, 0.0, 0.5]),
    (0.4, [255.0, 255.0, 0.0, 0.7]),
    (0.6, [255.0, 150.0, 0.0, 0.8]),
    (0.8, [255.0, 70.0, 0.0, 0.9]),
    (1.0, [255.0, 0.0, 0.0, 1.0]),
];

// 64 megapixels; the density grid alone is 512 MiB at this size.
const MAX_HEATMAP_PIXELS: usize = 1 << 26;

#[derive(Debug, Clone, Copy)]
pub struct HeatmapOptions {
    pub width: u32,
    pub height: u32,
    /// Kernel radius in pixels.
    pub radius: f64,
}

pub fn to_feature_collection(samples: &[Sample]) -> FeatureCollection {
    let features = samples
        .iter()
        .map(|s| {
            let mut properties = JsonObject::new();
            properties.insert("povertyIndex".to_string(), s.intensity.into());
            properties.insert("region".to_string(), s.region.as_str().into());
            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![s.lon(), s.lat()]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

pub fn write_geojson(path: &Path, samples: &[Sample]) -> Result<()> {
    let geojson = GeoJson::from(to_feature_collection(samples));
    fs::write(path, geojson.to_string())
        .with_context(|| format!("Failed to write GeoJSON: {:?}", path))?;
    info!("Wrote {} samples to {:?}", samples.len(), path);
    Ok(())
}

/// Rasterises samples into a heat image covering their bounding box, each
/// sample weighted by its intensity.
pub fn render_heatmap(samples: &[Sample], options: &HeatmapOptions) -> Result<RgbaImage> {
    let (width, height) = (options.width.max(1), options.height.max(1));
    let row_len = width as usize;
    let pixel_count = row_len
        .checked_mul(height as usize)
        .filter(|n| *n <= MAX_HEATMAP_PIXELS)
        .ok_or_else(|| {
            anyhow!(
                "Heatmap size {}x{} exceeds the {} pixel limit",
                width,
                height,
                MAX_HEATMAP_PIXELS
            )
        })?;

    let projected: MultiPoint<f64> = samples
        .iter()
        .map(|s| {
            let (x, y) = project(s.lat(), s.lon());
            Point::new(x, y)
        })
        .collect();

    let Some(bounds) = projected.bounding_rect() else {
        return Ok(ImageBuffer::new(width, height));
    };
    let bounds = pad(bounds);

    let sx = (width - 1).max(1) as f64 / bounds.width();
    let sy = (height - 1).max(1) as f64 / bounds.height();
    let pixels: Vec<(f64, f64, f64)> = projected
        .iter()
        .zip(samples)
        .map(|(p, s)| {
            (
                (p.x() - bounds.min().x) * sx,
                (p.y() - bounds.min().y) * sy,
                s.intensity,
            )
        })
        .collect();

    let radius = options.radius.max(0.5);
    let cutoff = radius * 3.0;
    let two_r2 = 2.0 * radius * radius;

    let mut density = vec![0.0_f64; pixel_count];
    density
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(row_idx, row)| {
            let y = row_idx as f64;
            for &(px, py, weight) in &pixels {
                let dy = y - py;
                if dy.abs() > cutoff {
                    continue;
                }
                let x0 = (px - cutoff).floor().max(0.0) as usize;
                let x1 = ((px + cutoff).ceil() as usize).min(row.len() - 1);
                for (x, cell) in row.iter_mut().enumerate().take(x1 + 1).skip(x0) {
                    let dx = x as f64 - px;
                    *cell += weight * (-(dx * dx + dy * dy) / two_r2).exp();
                }
            }
        });

    let peak = density.iter().cloned().fold(0.0_f64, f64::max);
    Ok(ImageBuffer::from_fn(width, height, |x, y| {
        let d = density[y as usize * row_len + x as usize];
        let t = if peak > 0.0 { d / peak } else { 0.0 };
        ramp_color(t)
    }))
}

pub fn write_heatmap(path: &Path, image: &RgbaImage) -> Result<()> {
    image
        .save(path)
        .with_context(|| format!("Failed to save heatmap: {:?}", path))?;
    info!("Wrote {}x{} heatmap to {:?}", image.width(), image.height(), path);
    Ok(())
}

/// Linear interpolation along the heat ramp; `t` is clamped to [0, 1].
pub fn ramp_color(t: f64) -> Rgba<u8> {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let upper = RAMP.iter().position(|(stop, _)| *stop >= t).unwrap_or(RAMP.len() - 1);
    let (hi_stop, hi) = RAMP[upper];
    let (lo_stop, lo) = RAMP[upper.saturating_sub(1)];
    let f = if hi_stop > lo_stop {
        (t - lo_stop) / (hi_stop - lo_stop)
    } else {
        1.0
    };
    let channel = |i: usize, scale: f64| ((lo[i] + (hi[i] - lo[i]) * f) * scale).round() as u8;
    Rgba([channel(0, 1.0), channel(1, 1.0), channel(2, 1.0), channel(3, 255.0)])
}

// Web Mercator to normalised world coordinates, y growing southwards.
fn project(lat: f64, lon: f64) -> (f64, f64) {
    let x = (lon + 180.0) / 360.0;
    let lat_rad = lat.to_radians();
    let y = (1.0 - (lat_rad.tan() + (1.0 / lat_rad.cos())).ln() / PI) / 2.0;
    (x, y)
}

// A single point or a straight line of points has a degenerate box.
fn pad(rect: Rect<f64>) -> Rect<f64> {
    let margin_x = (rect.width() * 0.05).max(1e-4);
    let margin_y = (rect.height() * 0.05).max(1e-4);
    Rect::new(
        Coord {
            x: rect.min().x - margin_x,
            y: rect.min().y - margin_y,
        },
        Coord {
            x: rect.max().x + margin_x,
            y: rect.max().y + margin_y,
        },
    )
}
