// Map state - layer toggles, pin and detail panels shared by the handlers
use crate::domain::coordinate::Coordinate;
use crate::domain::reading::GeoReading;
use serde::Serialize;

pub const DEFAULT_AIR_QUALITY_OPACITY: f64 = 0.7;

/// Snapshot of the air-quality layer settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayerState {
    pub visible: bool,
    pub opacity: f64,
}

#[derive(Debug, Clone)]
pub struct MapState {
    show_air_quality_overlay: bool,
    air_quality_opacity: f64,
    map_pin: Option<Coordinate>,
    show_map_pin_details: bool,
    selected_reading: Option<GeoReading>,
    show_air_quality_details: bool,
}

impl Default for MapState {
    fn default() -> Self {
        Self {
            show_air_quality_overlay: false,
            air_quality_opacity: DEFAULT_AIR_QUALITY_OPACITY,
            map_pin: None,
            show_map_pin_details: false,
            selected_reading: None,
            show_air_quality_details: false,
        }
    }
}

impl MapState {
    pub fn air_quality_layer(&self) -> LayerState {
        LayerState {
            visible: self.show_air_quality_overlay,
            opacity: self.air_quality_opacity,
        }
    }

    pub fn toggle_air_quality_overlay(&mut self) {
        self.show_air_quality_overlay = !self.show_air_quality_overlay;
    }

    /// Non-finite values are ignored; everything else is clamped to [0, 1]
    pub fn set_air_quality_opacity(&mut self, opacity: f64) {
        if opacity.is_finite() {
            self.air_quality_opacity = opacity.clamp(0.0, 1.0);
        }
    }

    pub fn map_pin(&self) -> Option<Coordinate> {
        self.map_pin
    }

    pub fn show_map_pin_details(&self) -> bool {
        self.show_map_pin_details
    }

    pub fn set_map_pin(&mut self, pin: Option<Coordinate>) {
        self.map_pin = pin;
    }

    /// `Some(v)` sets the panel state, `None` flips it
    pub fn toggle_map_pin_details(&mut self, show: Option<bool>) {
        self.show_map_pin_details = show.unwrap_or(!self.show_map_pin_details);
    }

    pub fn selected_reading(&self) -> Option<&GeoReading> {
        self.selected_reading.as_ref()
    }

    pub fn show_air_quality_details(&self) -> bool {
        self.show_air_quality_details
    }

    pub fn set_selected_reading(&mut self, reading: Option<GeoReading>) {
        self.selected_reading = reading;
    }

    pub fn toggle_air_quality_details(&mut self, show: Option<bool>) {
        self.show_air_quality_details = show.unwrap_or(!self.show_air_quality_details);
    }
}
