//! Static dashboard tables: provinces, indicators, headline statistics,
//! comparison and time series, and the data source catalogue.
//!
//! Everything lives in an owned [`Dashboard`] built once at startup and handed
//! to whoever renders it.

use crate::types::RegionKey;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct City {
    pub name: String,
    pub poverty_rate: f64,
    pub coordinates: LatLng,
}

#[derive(Debug, Clone, Serialize)]
pub struct Province {
    pub id: RegionKey,
    pub name: String,
    pub population: u64,
    pub poverty_rate: f64,
    pub urban_population_share: f64,
    pub coordinates: LatLng,
    pub top_cities: Vec<City>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Indicator {
    pub id: String,
    pub name: String,
    pub description: String,
    pub weight: f64,
}

/// Normalised [0, 1] indicator scores for one province.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorScores {
    pub province: RegionKey,
    pub light: f64,
    pub infrastructure: f64,
    pub economic: f64,
    pub health: f64,
}

impl IndicatorScores {
    pub fn score(&self, indicator_id: &str) -> Option<f64> {
        match indicator_id {
            "light" => Some(self.light),
            "infrastructure" => Some(self.infrastructure),
            "economic" => Some(self.economic),
            "health" => Some(self.health),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Worsening,
    Flat,
}

#[derive(Debug, Clone, Serialize)]
pub struct Statistic {
    pub id: String,
    pub title: String,
    pub value: String,
    pub change: f64,
    pub description: String,
}

impl Statistic {
    // Every headline figure measures poverty, so a drop is good news.
    pub fn trend(&self) -> Trend {
        if self.change < 0.0 {
            Trend::Improving
        } else if self.change > 0.0 {
            Trend::Worsening
        } else {
            Trend::Flat
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Series {
    pub name: String,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesTable {
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

/// One category with the value of every series at that category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRow {
    pub category: String,
    pub values: Vec<(String, f64)>,
}

impl SeriesTable {
    /// Transposes series-major data into one row per category. Series shorter
    /// than the category list are skipped for the missing categories.
    pub fn rows(&self) -> Vec<CategoryRow> {
        self.categories
            .iter()
            .enumerate()
            .map(|(i, category)| CategoryRow {
                category: category.clone(),
                values: self
                    .series
                    .iter()
                    .filter_map(|s| s.data.get(i).map(|v| (s.name.clone(), *v)))
                    .collect(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DataSource {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub last_updated: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PovertyLevel {
    High,
    Medium,
    Low,
}

impl PovertyLevel {
    pub fn classify(rate: f64) -> Self {
        if rate >= 0.35 {
            PovertyLevel::High
        } else if rate >= 0.25 {
            PovertyLevel::Medium
        } else {
            PovertyLevel::Low
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RadarPoint {
    pub subject: String,
    pub value: f64,
    pub full_mark: f64,
}

/// Province marker for the map-less fallback view.
#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub province: RegionKey,
    pub name: String,
    pub percent: u32,
    pub level: PovertyLevel,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub provinces: Vec<Province>,
    pub indicators: Vec<Indicator>,
    pub indicator_scores: Vec<IndicatorScores>,
    pub stats: Vec<Statistic>,
    pub comparison: SeriesTable,
    pub time_series: SeriesTable,
    pub data_sources: Vec<DataSource>,
}

impl Dashboard {
    pub fn province(&self, id: RegionKey) -> Option<&Province> {
        self.provinces.iter().find(|p| p.id == id)
    }

    fn scores(&self, id: RegionKey) -> Option<&IndicatorScores> {
        self.indicator_scores.iter().find(|s| s.province == id)
    }

    /// Indicator scores scaled to percentages, one point per indicator.
    pub fn radar(&self, province: &str) -> Option<Vec<RadarPoint>> {
        let scores = self.scores(province.parse().ok()?)?;
        Some(
            self.indicators
                .iter()
                .filter_map(|indicator| {
                    scores.score(&indicator.id).map(|s| RadarPoint {
                        subject: indicator.name.clone(),
                        value: s * 100.0,
                        full_mark: 100.0,
                    })
                })
                .collect(),
        )
    }

    /// Weighted sum of a province's indicator scores.
    pub fn composite_index(&self, id: RegionKey) -> Option<f64> {
        let scores = self.scores(id)?;
        Some(
            self.indicators
                .iter()
                .filter_map(|i| scores.score(&i.id).map(|s| s * i.weight))
                .sum(),
        )
    }

    pub fn markers(&self) -> Vec<Marker> {
        self.provinces
            .iter()
            .map(|p| Marker {
                province: p.id,
                name: p.name.clone(),
                percent: (p.poverty_rate * 100.0).round() as u32,
                level: PovertyLevel::classify(p.poverty_rate),
            })
            .collect()
    }

    /// The mock tables shipped with the dashboard.
    pub fn pakistan() -> Self {
        Self {
            provinces: provinces(),
            indicators: indicators(),
            indicator_scores: vec![
                scores(RegionKey::Punjab, 0.75, 0.68, 0.72, 0.65),
                scores(RegionKey::Sindh, 0.62, 0.57, 0.65, 0.54),
                scores(RegionKey::Kpk, 0.58, 0.52, 0.60, 0.58),
                scores(RegionKey::Balochistan, 0.45, 0.41, 0.52, 0.38),
            ],
            stats: stats(),
            comparison: table(
                &["Urban", "Rural", "Overall"],
                &[
                    ("Punjab", &[14.5, 26.2, 21.0]),
                    ("Sindh", &[19.8, 43.1, 31.0]),
                    ("KPK", &[16.2, 30.1, 27.0]),
                    ("Balochistan", &[22.1, 45.6, 37.0]),
                    ("National", &[18.0, 31.0, 24.0]),
                ],
            ),
            time_series: table(
                &["2018", "2019", "2020", "2021", "2022", "2023"],
                &[
                    ("Punjab", &[26.3, 25.1, 24.8, 23.5, 22.0, 21.0]),
                    ("Sindh", &[37.8, 36.5, 35.9, 34.2, 32.8, 31.0]),
                    ("KPK", &[32.5, 31.8, 30.9, 29.5, 28.1, 27.0]),
                    ("Balochistan", &[42.3, 41.5, 40.8, 39.6, 38.2, 37.0]),
                ],
            ),
            data_sources: data_sources(),
        }
    }
}

fn city(name: &str, poverty_rate: f64, lat: f64, lng: f64) -> City {
    City {
        name: name.to_string(),
        poverty_rate,
        coordinates: LatLng { lat, lng },
    }
}

fn provinces() -> Vec<Province> {
    vec![
        Province {
            id: RegionKey::Punjab,
            name: "Punjab".to_string(),
            population: 110_000_000,
            poverty_rate: 0.21,
            urban_population_share: 0.37,
            coordinates: LatLng { lat: 31.1704, lng: 72.7097 },
            top_cities: vec![
                city("Lahore", 0.12, 31.5204, 74.3587),
                city("Faisalabad", 0.19, 31.4180, 73.0790),
                city("Multan", 0.23, 30.1984, 71.4687),
                city("Rawalpindi", 0.10, 33.5651, 73.0169),
                city("Gujranwala", 0.18, 32.1617, 74.1883),
                city("Muzaffargarh", 0.41, 30.0747, 71.1893),
                city("Rajanpur", 0.48, 29.1041, 70.3297),
            ],
        },
        Province {
            id: RegionKey::Sindh,
            name: "Sindh".to_string(),
            population: 47_890_000,
            poverty_rate: 0.31,
            urban_population_share: 0.52,
            coordinates: LatLng { lat: 25.8943, lng: 68.5247 },
            top_cities: vec![
                city("Karachi", 0.19, 24.8607, 67.0011),
                city("Hyderabad", 0.27, 25.3960, 68.3578),
                city("Sukkur", 0.34, 27.7055, 68.8522),
                city("Larkana", 0.39, 27.5600, 68.2264),
                city("Tharparkar", 0.54, 24.7368, 70.1823),
            ],
        },
        Province {
            id: RegionKey::Kpk,
            name: "Khyber Pakhtunkhwa".to_string(),
            population: 35_530_000,
            poverty_rate: 0.27,
            urban_population_share: 0.21,
            coordinates: LatLng { lat: 34.9526, lng: 72.3311 },
            top_cities: vec![
                city("Peshawar", 0.18, 34.0151, 71.5249),
                city("Mardan", 0.29, 34.1989, 72.0231),
                city("Abbottabad", 0.14, 34.1463, 73.2115),
                city("Swat", 0.31, 34.9479, 72.3311),
                city("Bannu", 0.38, 32.9889, 70.6056),
            ],
        },
        Province {
            id: RegionKey::Balochistan,
            name: "Balochistan".to_string(),
            population: 12_340_000,
            poverty_rate: 0.37,
            urban_population_share: 0.29,
            coordinates: LatLng { lat: 28.4907, lng: 65.0958 },
            top_cities: vec![
                city("Quetta", 0.22, 30.1798, 66.9750),
                city("Gwadar", 0.28, 25.1264, 62.3225),
                city("Turbat", 0.41, 26.0031, 63.0544),
                city("Sibi", 0.39, 29.5430, 67.8772),
                city("Khuzdar", 0.46, 27.8120, 66.6165),
            ],
        },
    ]
}

fn indicators() -> Vec<Indicator> {
    let indicator = |id: &str, name: &str, description: &str, weight| Indicator {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        weight,
    };
    vec![
        indicator(
            "light",
            "Light Intensity",
            "Satellite measurements of nighttime light emissions, indicating electricity access and infrastructure development",
            0.30,
        ),
        indicator(
            "infrastructure",
            "Infrastructure",
            "Density of schools, utilities, and public services",
            0.25,
        ),
        indicator(
            "economic",
            "Economic Activity",
            "Retail presence, brand distribution, and property values",
            0.25,
        ),
        indicator(
            "health",
            "Health Access",
            "Proximity and availability of healthcare facilities",
            0.20,
        ),
    ]
}

fn scores(province: RegionKey, light: f64, infrastructure: f64, economic: f64, health: f64) -> IndicatorScores {
    IndicatorScores {
        province,
        light,
        infrastructure,
        economic,
        health,
    }
}

fn stats() -> Vec<Statistic> {
    let stat = |id: &str, title: &str, value: &str, change, description: &str| Statistic {
        id: id.to_string(),
        title: title.to_string(),
        value: value.to_string(),
        change,
        description: description.to_string(),
    };
    vec![
        stat(
            "total-population",
            "Total Population in Poverty",
            "50.2M",
            -2.5,
            "Estimated population living below the national poverty line",
        ),
        stat(
            "poverty-rate",
            "National Poverty Rate",
            "24%",
            -1.2,
            "Percentage of population living in poverty",
        ),
        stat("rural-poverty", "Rural Poverty Rate", "31%", -0.7, "Poverty rate in rural areas"),
        stat("urban-poverty", "Urban Poverty Rate", "18%", -1.5, "Poverty rate in urban areas"),
    ]
}

fn table(categories: &[&str], series: &[(&str, &[f64])]) -> SeriesTable {
    SeriesTable {
        categories: categories.iter().map(|c| c.to_string()).collect(),
        series: series
            .iter()
            .map(|(name, data)| Series {
                name: name.to_string(),
                data: data.to_vec(),
            })
            .collect(),
    }
}

fn data_sources() -> Vec<DataSource> {
    let source = |id: &str, name: &str, kind: &str, description: &str, last_updated: &str| DataSource {
        id: id.to_string(),
        name: name.to_string(),
        kind: kind.to_string(),
        description: description.to_string(),
        last_updated: last_updated.to_string(),
    };
    vec![
        source(
            "light-intensity",
            "NASA Black Marble",
            "Satellite",
            "Nighttime light intensity data from NASA's Black Marble and NOAA's VIIRS dataset",
            "2023-09-15",
        ),
        source(
            "schools",
            "Google Maps API (Schools)",
            "API",
            "School and educational institution locations across Pakistan",
            "2023-10-01",
        ),
        source(
            "retail",
            "Google Maps API (Retail)",
            "API",
            "Retail and utility locations for commerce index",
            "2023-10-01",
        ),
        source(
            "brands",
            "Golootlo",
            "Web Scraping",
            "Distribution of national vs. international brands",
            "2023-09-20",
        ),
        source(
            "property",
            "Zameen.com",
            "Web Scraping",
            "Property rates and listings across Pakistan",
            "2023-10-05",
        ),
        source(
            "health",
            "PHIMC + Ministry of Health",
            "Manual + API",
            "Health facility locations and accessibility data",
            "2023-08-12",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_weights_sum_to_one() {
        let dashboard = Dashboard::pakistan();
        let total: f64 = dashboard.indicators.iter().map(|i| i.weight).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn every_region_has_a_province_and_scores() {
        let dashboard = Dashboard::pakistan();
        for key in RegionKey::ALL {
            let province = dashboard.province(key).unwrap();
            assert_eq!(province.name, key.display_name());
            assert!(dashboard.composite_index(key).is_some());
        }
    }

    #[test]
    fn radar_scales_scores_to_percent() {
        let radar = Dashboard::pakistan().radar("sindh").unwrap();
        assert_eq!(radar.len(), 4);
        assert_eq!(radar[0].subject, "Light Intensity");
        assert!((radar[0].value - 62.0).abs() < 1e-9);
        assert!((radar[3].value - 54.0).abs() < 1e-9);
        assert!(radar.iter().all(|p| p.full_mark == 100.0));
    }

    #[test]
    fn radar_for_unknown_province_is_none() {
        assert!(Dashboard::pakistan().radar("gilgit").is_none());
    }

    #[test]
    fn composite_index_weights_scores() {
        let index = Dashboard::pakistan()
            .composite_index(RegionKey::Balochistan)
            .unwrap();
        let expected = 0.45 * 0.30 + 0.41 * 0.25 + 0.52 * 0.25 + 0.38 * 0.20;
        assert!((index - expected).abs() < 1e-9);
    }

    #[test]
    fn poverty_level_thresholds() {
        assert_eq!(PovertyLevel::classify(0.37), PovertyLevel::High);
        assert_eq!(PovertyLevel::classify(0.35), PovertyLevel::High);
        assert_eq!(PovertyLevel::classify(0.31), PovertyLevel::Medium);
        assert_eq!(PovertyLevel::classify(0.25), PovertyLevel::Medium);
        assert_eq!(PovertyLevel::classify(0.21), PovertyLevel::Low);
    }

    #[test]
    fn markers_round_rates_to_percent() {
        let markers = Dashboard::pakistan().markers();
        let levels: Vec<_> = markers.iter().map(|m| (m.percent, m.level)).collect();
        assert_eq!(
            levels,
            vec![
                (21, PovertyLevel::Low),
                (31, PovertyLevel::Medium),
                (27, PovertyLevel::Medium),
                (37, PovertyLevel::High),
            ]
        );
    }

    #[test]
    fn comparison_rows_transpose_series() {
        let rows = Dashboard::pakistan().comparison.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].category, "Rural");
        assert_eq!(rows[1].values[1], ("Sindh".to_string(), 43.1));
        assert_eq!(rows[2].values.last(), Some(&("National".to_string(), 24.0)));
    }

    #[test]
    fn short_series_are_skipped_in_missing_categories() {
        let x: &[f64] = &[1.0, 2.0];
        let y: &[f64] = &[3.0];
        let t = table(&["a", "b"], &[("x", x), ("y", y)]);
        let rows = t.rows();
        assert_eq!(rows[0].values.len(), 2);
        assert_eq!(rows[1].values, vec![("x".to_string(), 2.0)]);
    }

    #[test]
    fn falling_headline_figures_are_improvements() {
        let dashboard = Dashboard::pakistan();
        assert!(dashboard.stats.iter().all(|s| s.trend() == Trend::Improving));
        let mut flat = dashboard.stats[0].clone();
        flat.change = 0.0;
        assert_eq!(flat.trend(), Trend::Flat);
    }

    #[test]
    fn serializes_data_source_kind_as_type() {
        let json = serde_json::to_value(&Dashboard::pakistan().data_sources[0]).unwrap();
        assert_eq!(json["type"], "Satellite");
        assert_eq!(json["last_updated"], "2023-09-15");
    }
}
