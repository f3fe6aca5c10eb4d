// HTTP request handlers
use crate::application::map_state::LayerState;
use crate::application::overlay::{OverlayView, PointerKind};
use crate::application::reading_source::SourceStats;
use crate::domain::coordinate::Coordinate;
use crate::domain::location::{describe_location, LocationInfo};
use crate::domain::reading::GeoReading;
use crate::domain::severity::{classify, SeverityTier};
use crate::presentation::app_state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

#[derive(Debug, Deserialize)]
pub struct SelectionBody {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub struct GestureBody {
    pub kind: PointerKind,
    #[serde(default)]
    pub x: f64,
}

#[derive(Debug, Deserialize)]
pub struct OffsetBody {
    pub index: usize,
}

#[derive(Debug, Deserialize)]
pub struct LayerUpdate {
    pub visible: Option<bool>,
    pub opacity: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct PollutantValue {
    pub name: &'static str,
    pub value: Option<f64>,
}

/// Detail panel for a clicked air-quality reading
#[derive(Debug, Serialize)]
pub struct ReadingDetails {
    pub reading: GeoReading,
    pub tier: SeverityTier,
    pub label: &'static str,
    pub color: &'static str,
    pub pollutants: Vec<PollutantValue>,
}

impl ReadingDetails {
    fn from_reading(reading: GeoReading) -> Self {
        // `as` saturates, NaN becomes 0
        let tier = classify(reading.aqi.round() as i32);
        let pollutants = reading
            .pollutants
            .iter()
            .map(|(name, value)| PollutantValue { name, value })
            .collect();

        Self {
            reading,
            tier,
            label: tier.label(),
            color: tier.hex(),
            pollutants,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UpstreamHealth {
    pub healthy: bool,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn get_overlay(State(state): State<Arc<AppState>>) -> Json<OverlayView> {
    Json(state.overlay_service.view())
}

/// Host tapped the map: drop the pin there and point the overlay at it
pub async fn put_selection(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SelectionBody>,
) -> Result<Json<OverlayView>, (StatusCode, String)> {
    let coordinate = Coordinate::new(body.lat, body.lng)
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;

    {
        let mut map = state.map_state();
        map.set_map_pin(Some(coordinate));
        map.toggle_map_pin_details(Some(true));
    }

    Ok(Json(state.overlay_service.select(Some(coordinate)).view))
}

pub async fn clear_selection(State(state): State<Arc<AppState>>) -> Json<OverlayView> {
    {
        let mut map = state.map_state();
        map.set_map_pin(None);
        map.toggle_map_pin_details(Some(false));
    }

    Json(state.overlay_service.select(None).view)
}

pub async fn post_gesture(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GestureBody>,
) -> Json<OverlayView> {
    Json(state.overlay_service.pointer(body.kind, body.x).view)
}

pub async fn put_offset(
    State(state): State<Arc<AppState>>,
    Json(body): Json<OffsetBody>,
) -> Json<OverlayView> {
    Json(state.overlay_service.set_offset_index(body.index).view)
}

/// Server-sent stream of offset changes
pub async fn offset_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let mut rx = state.overlay_service.subscribe();

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(change) => yield Event::default().event("offset-changed").json_data(change),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Offset event subscriber lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Location details for the current map pin
pub async fn get_pin(State(state): State<Arc<AppState>>) -> Result<Json<LocationInfo>, StatusCode> {
    let pin = state.map_state().map_pin().ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(describe_location(&pin)))
}

pub async fn get_layers(State(state): State<Arc<AppState>>) -> Json<LayerState> {
    Json(state.map_state().air_quality_layer())
}

pub async fn put_layers(
    State(state): State<Arc<AppState>>,
    Json(update): Json<LayerUpdate>,
) -> Json<LayerState> {
    let mut map = state.map_state();
    if let Some(visible) = update.visible {
        if visible != map.air_quality_layer().visible {
            map.toggle_air_quality_overlay();
        }
    }
    if let Some(opacity) = update.opacity {
        map.set_air_quality_opacity(opacity);
    }
    Json(map.air_quality_layer())
}

pub async fn get_selected_reading(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReadingDetails>, StatusCode> {
    let map = state.map_state();
    if !map.show_air_quality_details() {
        return Err(StatusCode::NOT_FOUND);
    }
    let reading = map.selected_reading().cloned().ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(ReadingDetails::from_reading(reading)))
}

pub async fn put_selected_reading(
    State(state): State<Arc<AppState>>,
    Json(reading): Json<GeoReading>,
) -> Json<ReadingDetails> {
    {
        let mut map = state.map_state();
        map.set_selected_reading(Some(reading.clone()));
        map.toggle_air_quality_details(Some(true));
    }
    Json(ReadingDetails::from_reading(reading))
}

pub async fn clear_selected_reading(State(state): State<Arc<AppState>>) -> StatusCode {
    let mut map = state.map_state();
    map.toggle_air_quality_details(Some(false));
    map.set_selected_reading(None);
    StatusCode::NO_CONTENT
}

pub async fn upstream_health(State(state): State<Arc<AppState>>) -> Json<UpstreamHealth> {
    let healthy = match state.overlay_service.upstream_health().await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::error!("Health check against air-quality API failed: {:#}", e);
            false
        }
    };
    Json(UpstreamHealth { healthy })
}

pub async fn upstream_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SourceStats>, StatusCode> {
    match state.overlay_service.upstream_stats().await {
        Ok(stats) => Ok(Json(stats)),
        Err(e) => {
            tracing::error!("Error fetching stats from air-quality API: {:#}", e);
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}
