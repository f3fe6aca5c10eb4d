// Remote air-quality reading (wire model) and nearest-station lookup
use super::coordinate::Coordinate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pollutants {
    #[serde(default)]
    pub pm25: Option<f64>,
    #[serde(default)]
    pub pm10: Option<f64>,
    #[serde(default)]
    pub o3: Option<f64>,
    #[serde(default)]
    pub no2: Option<f64>,
    #[serde(default)]
    pub so2: Option<f64>,
    #[serde(default)]
    pub co: Option<f64>,
}

impl Pollutants {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Option<f64>)> {
        [
            ("pm25", self.pm25),
            ("pm10", self.pm10),
            ("o3", self.o3),
            ("no2", self.no2),
            ("so2", self.so2),
            ("co", self.co),
        ]
        .into_iter()
    }

    /// Compact one-line summary for the overlay, e.g. "PM2.5: 12, O₃: 40".
    /// Only the four headline pollutants are listed; zero counts as absent.
    pub fn summary(&self) -> Option<String> {
        let headline = [
            ("PM2.5", self.pm25),
            ("PM10", self.pm10),
            ("O₃", self.o3),
            ("NO₂", self.no2),
        ];

        let parts: Vec<String> = headline
            .iter()
            .filter_map(|(name, value)| match value {
                Some(v) if *v != 0.0 => Some(format!("{}: {}", name, v)),
                _ => None,
            })
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoReading {
    pub timestamp: String,
    pub location: GeoPoint,
    pub aqi: f64,
    #[serde(default)]
    pub pollutants: Pollutants,
}

impl GeoReading {
    pub fn distance_degrees(&self, coord: &Coordinate) -> f64 {
        coord.distance_to(self.location.lat, self.location.lng)
    }
}

/// Reading closest to `coord`. On ties the earlier reading wins.
pub fn nearest<'a>(readings: &'a [GeoReading], coord: &Coordinate) -> Option<&'a GeoReading> {
    let mut best: Option<(&GeoReading, f64)> = None;
    for reading in readings {
        let distance = reading.distance_degrees(coord);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((reading, distance)),
        }
    }
    best.map(|(reading, _)| reading)
}
