use crate::types::MapView;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default = "default_anchors")]
    pub anchors: Vec<AnchorConfig>,
    #[serde(default)]
    pub map: MapView,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            generator: GeneratorConfig::default(),
            anchors: default_anchors(),
            map: MapView::default(),
            output: OutputConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// Tuning constants for the sample generator. The defaults reproduce the
/// dashboard's original visual footprint.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    pub samples_per_region: usize,
    /// Degrees of latitude per unit of spread.
    pub lat_scale: f64,
    /// Degrees of longitude per unit of spread.
    pub lng_scale: f64,
    pub distance_weight: f64,
    pub jitter_range: f64,
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            samples_per_region: 100,
            lat_scale: 0.01,
            lng_scale: 0.015,
            distance_weight: 0.5,
            jitter_range: 0.3,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    /// Degrees per unit of spread along the wider axis.
    pub fn max_scale(&self) -> f64 {
        self.lat_scale.max(self.lng_scale)
    }
}

// Region stays a string here so that a bad key is reported by anchor
// validation instead of a TOML parse error.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AnchorConfig {
    pub region: String,
    pub lat: f64,
    pub lon: f64,
    pub spread: f64,
    pub base_intensity: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub heatmap_width: u32,
    pub heatmap_height: u32,
    /// Kernel radius in pixels.
    pub heatmap_radius: f64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            heatmap_width: 1024,
            heatmap_height: 1024,
            heatmap_radius: 6.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

/// Provincial centers with the provincial poverty rate as baseline.
pub fn default_anchors() -> Vec<AnchorConfig> {
    let anchor = |region: &str, lat, lon, spread, base_intensity| AnchorConfig {
        region: region.to_string(),
        lat,
        lon,
        spread,
        base_intensity,
    };
    vec![
        anchor("punjab", 31.1704, 72.7097, 150.0, 0.21),
        anchor("sindh", 25.8943, 68.5247, 120.0, 0.31),
        anchor("kpk", 34.9526, 72.3311, 100.0, 0.27),
        anchor("balochistan", 28.4907, 65.0958, 200.0, 0.37),
    ]
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_config_falls_back_to_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.generator, GeneratorConfig::default());
        assert_eq!(config.anchors, default_anchors());
        assert_eq!(config.map, MapView::default());
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.output.dir, PathBuf::from("output"));
    }

    #[test]
    fn partial_generator_section_keeps_other_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [generator]
            samples_per_region = 250
            seed = 7
            "#,
        )
        .unwrap();
        assert_eq!(config.generator.samples_per_region, 250);
        assert_eq!(config.generator.seed, Some(7));
        assert_eq!(config.generator.lng_scale, 0.015);
        assert_eq!(config.generator.distance_weight, 0.5);
    }

    #[test]
    fn explicit_anchors_replace_the_default_table() {
        let config = AppConfig::from_toml_str(
            r#"
            [[anchors]]
            region = "sindh"
            lat = 25.0
            lon = 68.0
            spread = 10.0
            base_intensity = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(config.anchors.len(), 1);
        assert_eq!(config.anchors[0].region, "sindh");
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(AppConfig::from_toml_str("[generator\nlat_scale = ").is_err());
    }

    #[test]
    fn loads_the_repository_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{}",
            include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml"))
        )
        .unwrap();
        let config = AppConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.anchors.len(), 4);
        assert_eq!(config.output.heatmap_width, 1024);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load_from_file(&dir.path().join("nope.toml")).is_err());
    }
}
