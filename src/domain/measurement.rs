// Measurement domain model and the offline AQI estimate
use super::coordinate::Coordinate;
use super::reading::{GeoReading, Pollutants};
use super::severity::{AQI_MAX, AQI_MIN};
use std::f64::consts::PI;

#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub aqi: Option<u16>,
    pub pollutants: Pollutants,
    pub resolved_at: Coordinate,
    pub for_offset: u32,
}

impl Measurement {
    pub fn from_reading(reading: &GeoReading, resolved_at: Coordinate, for_offset: u32) -> Self {
        let aqi = if reading.aqi.is_finite() {
            Some(clamp_aqi(reading.aqi.round()))
        } else {
            None
        };

        Self {
            aqi,
            pollutants: reading.pollutants.clone(),
            resolved_at,
            for_offset,
        }
    }

    /// Offline measurement built from `compute_aqi`, with particulate
    /// estimates derived from the index.
    pub fn estimated(coord: Coordinate, offset: u32) -> Self {
        let aqi = compute_aqi(&coord, offset);
        let value = f64::from(aqi);

        Self {
            aqi: Some(aqi),
            pollutants: Pollutants {
                pm25: Some(round_one(value * 0.4)),
                pm10: Some(round_one(value * 0.6)),
                ..Pollutants::default()
            },
            resolved_at: coord,
            for_offset: offset,
        }
    }
}

/// Deterministic AQI estimate for a coordinate and forecast offset.
///
/// The spatial term is a smooth sine/cosine blend over latitude and longitude
/// (range [50, 250]) so neighbouring points get similar values. The temporal
/// term is a bounded wave over the offset hours (amplitude 40).
pub fn compute_aqi(coord: &Coordinate, offset: u32) -> u16 {
    let lat = coord.latitude().to_radians();
    let lng = coord.longitude().to_radians();

    let spatial = 150.0 + 60.0 * (3.0 * lat).sin() * (2.0 * lng).cos() + 40.0 * (lat + lng).sin();
    let temporal = 40.0 * (f64::from(offset) * PI / 12.0).sin();

    clamp_aqi((spatial + temporal).round())
}

fn clamp_aqi(value: f64) -> u16 {
    value.clamp(f64::from(AQI_MIN), f64::from(AQI_MAX)) as u16
}

fn round_one(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
