pub mod types;
pub mod config;
pub mod anchors;
pub mod data;
pub mod processing;
pub mod render;
pub mod server;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate heatmap samples as GeoJSON plus a fallback PNG heatmap
    Generate {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        /// Restrict generation to one region (punjab, sindh, kpk, balochistan)
        #[arg(short, long)]
        region: Option<String>,
    },
    /// Serve samples, map view and dashboard tables over HTTP
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Print the dashboard summary tables
    Summary,
}

fn load(config: &Path) -> anyhow::Result<(config::AppConfig, anchors::AnchorTable)> {
    let app_config = config::AppConfig::load_from_file(config)?;
    let anchor_table =
        anchors::AnchorTable::from_config(&app_config.anchors, &app_config.generator)
            .context("Invalid anchor table")?;
    info!("Loaded {} region anchors", anchor_table.len());
    Ok((app_config, anchor_table))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Generate { config, region } => {
            info!("Generating samples with config: {:?}", config);
            let (app_config, anchor_table) = load(config)?;

            let mut rng = match app_config.generator.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let samples = processing::generate_samples(
                &anchor_table,
                &app_config.generator,
                region.as_deref(),
                &mut rng,
            );

            let out_dir = &app_config.output.dir;
            fs::create_dir_all(out_dir)
                .with_context(|| format!("Failed to create output directory: {:?}", out_dir))?;

            render::write_geojson(&out_dir.join("samples.geojson"), &samples)?;

            let heatmap = render::render_heatmap(
                &samples,
                &render::HeatmapOptions {
                    width: app_config.output.heatmap_width,
                    height: app_config.output.heatmap_height,
                    radius: app_config.output.heatmap_radius,
                },
            )?;
            render::write_heatmap(&out_dir.join("heatmap.png"), &heatmap)?;

            info!("Generation complete!");
        }
        Commands::Serve { config } => {
            info!("Serving with config: {:?}", config);
            let (app_config, anchor_table) = load(config)?;
            server::start_server(app_config, anchor_table).await?;
        }
        Commands::Summary => print_summary(&data::Dashboard::pakistan()),
    }

    Ok(())
}

fn print_summary(dashboard: &data::Dashboard) {
    for stat in &dashboard.stats {
        println!("{:<30} {:>8} ({:+.1}%, {:?})", stat.title, stat.value, stat.change, stat.trend());
    }
    println!();

    for marker in dashboard.markers() {
        let composite = dashboard.composite_index(marker.province).unwrap_or_default();
        let population = dashboard
            .province(marker.province)
            .map(|p| p.population)
            .unwrap_or_default();
        println!(
            "{:<20} {:>3}% {:?} population {} composite {:.3}",
            marker.name, marker.percent, marker.level, population, composite
        );
    }
    println!();

    if let Some(latest) = dashboard.time_series.rows().last() {
        for (name, value) in &latest.values {
            println!("{} {:<12} {:.1}%", latest.category, name, value);
        }
    }
    println!();

    for row in dashboard.comparison.rows() {
        let cells: Vec<String> = row
            .values
            .iter()
            .map(|(name, value)| format!("{name} {value:.1}"))
            .collect();
        println!("{:<8} {}", row.category, cells.join(", "));
    }
    println!();

    for source in &dashboard.data_sources {
        println!("{:<28} {:<14} {}", source.name, source.kind, source.last_updated);
    }
}
