// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use anyhow::Context;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::overlay::TimeIndexedOverlay;
use crate::application::overlay_service::OverlayService;
use crate::domain::forecast::ForecastTimeline;
use crate::domain::gesture::GestureRecognizer;
use crate::infrastructure::api_client::HttpReadingSource;
use crate::infrastructure::config::load_overlay_config;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    clear_selected_reading, clear_selection, get_layers, get_overlay, get_pin,
    get_selected_reading, health_check, offset_events, post_gesture, put_layers, put_offset,
    put_selected_reading, put_selection, upstream_health, upstream_stats,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_overlay_config()?;

    // Remote data source (infrastructure layer)
    let source = Arc::new(HttpReadingSource::new(config.api.base_url.clone()));

    // Overlay core and its driver (application layer)
    let timeline = ForecastTimeline::new(config.overlay.time_offsets.clone())
        .context("Invalid overlay.time_offsets")?;
    let gesture = GestureRecognizer::new(config.overlay.drag_threshold)
        .context("Invalid overlay.drag_threshold")?;
    let overlay =
        TimeIndexedOverlay::new(timeline, gesture, config.overlay.reset_offset_on_select);
    let overlay_service =
        OverlayService::new(overlay, source, config.overlay.mode, config.api.timeout());

    let state = Arc::new(AppState::new(overlay_service));

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/overlay", get(get_overlay))
        .route("/selection", axum::routing::put(put_selection).delete(clear_selection))
        .route("/gesture", axum::routing::post(post_gesture))
        .route("/offset", axum::routing::put(put_offset))
        .route("/events", get(offset_events))
        .route("/pin", get(get_pin))
        .route("/layers", get(get_layers).put(put_layers))
        .route(
            "/readings/selected",
            get(get_selected_reading)
                .put(put_selected_reading)
                .delete(clear_selected_reading),
        )
        .route("/upstream/health", get(upstream_health))
        .route("/upstream/stats", get(upstream_stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid server.listen_addr {}", config.server.listen_addr))?;
    tracing::info!(
        "Starting aq-overlay on {} (mode {:?}, data API {})",
        addr,
        config.overlay.mode,
        config.api.base_url
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
