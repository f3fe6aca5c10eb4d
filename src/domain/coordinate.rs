// Geographic coordinate value type
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CoordinateError {
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::Latitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Planar distance in degrees, good enough for picking the closest station
    pub fn distance_to(&self, latitude: f64, longitude: f64) -> f64 {
        let dlat = self.latitude - latitude;
        let dlng = self.longitude - longitude;
        (dlat * dlat + dlng * dlng).sqrt()
    }

    /// Caption shown under the overlay, e.g. "41.716°, 44.783°"
    pub fn label(&self) -> String {
        format!("{:.3}°, {:.3}°", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Axis {
    Latitude,
    Longitude,
}

/// Convert decimal degrees to a degrees/minutes/seconds string.
/// Each component is truncated, not rounded.
pub fn to_dms(value: f64, axis: Axis) -> String {
    let absolute = value.abs();
    let degrees = absolute.floor();
    let minutes_float = (absolute - degrees) * 60.0;
    let minutes = minutes_float.floor();
    let seconds = ((minutes_float - minutes) * 60.0).floor();

    let direction = match (axis, value >= 0.0) {
        (Axis::Latitude, true) => 'N',
        (Axis::Latitude, false) => 'S',
        (Axis::Longitude, true) => 'E',
        (Axis::Longitude, false) => 'W',
    };

    format!(
        "{}° {}' {}\" {}",
        degrees as u32, minutes as u32, seconds as u32, direction
    )
}
