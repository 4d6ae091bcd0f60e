use crate::anchors::AnchorTable;
use crate::config::AppConfig;
use crate::data::{Dashboard, RadarPoint};
use crate::processing::generate_samples;
use crate::render::to_feature_collection;
use crate::types::{MapView, RegionKey};
use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use geojson::FeatureCollection;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

pub struct AppState {
    pub anchors: AnchorTable,
    pub dashboard: Dashboard,
    pub config: AppConfig,
}

#[derive(Deserialize)]
pub struct SamplesParams {
    region: Option<String>,
}

#[derive(Deserialize)]
pub struct PointParams {
    lat: f64,
    lon: f64,
}

pub fn router(state: Arc<AppState>) -> Router {
    let output_service = ServeDir::new(&state.config.output.dir);

    Router::new()
        .route("/api/samples", get(samples_handler))
        .route("/api/map", get(map_handler))
        .route("/api/region", get(region_handler))
        .route("/api/dashboard", get(dashboard_handler))
        .route("/api/radar/:province", get(radar_handler))
        .nest_service("/output", output_service)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(config: AppConfig, anchors: AnchorTable) -> Result<()> {
    let port = config.server.port;
    let state = Arc::new(AppState {
        anchors,
        dashboard: Dashboard::pakistan(),
        config,
    });

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn samples_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SamplesParams>,
) -> Json<FeatureCollection> {
    let samples = {
        let mut rng = rand::thread_rng();
        generate_samples(
            &state.anchors,
            &state.config.generator,
            params.region.as_deref(),
            &mut rng,
        )
    };
    Json(to_feature_collection(&samples))
}

async fn map_handler(State(state): State<Arc<AppState>>) -> Json<MapView> {
    Json(state.config.map)
}

async fn region_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PointParams>,
) -> Json<Option<RegionKey>> {
    Json(state.anchors.nearest_region(params.lat, params.lon))
}

async fn dashboard_handler(State(state): State<Arc<AppState>>) -> Json<Dashboard> {
    Json(state.dashboard.clone())
}

async fn radar_handler(
    State(state): State<Arc<AppState>>,
    Path(province): Path<String>,
) -> Result<Json<Vec<RadarPoint>>, StatusCode> {
    state
        .dashboard
        .radar(&province)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}
