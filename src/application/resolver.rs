// Measurement resolver - networked lookup of the closest published reading
use crate::application::reading_source::ReadingSource;
use crate::domain::coordinate::Coordinate;
use crate::domain::forecast::date_key;
use crate::domain::measurement::Measurement;
use crate::domain::reading::nearest;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("no readings published for {date}")]
    NotFound { date: NaiveDate },
    #[error("network error: {0}")]
    Network(String),
}

/// Where overlay measurements come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolverMode {
    /// Deterministic offline estimate
    Local,
    /// Nearest reading from the remote API
    Remote,
}

pub async fn fetch_measurement(
    source: &dyn ReadingSource,
    coord: Coordinate,
    offset: u32,
    now: DateTime<Utc>,
) -> Result<Measurement, FetchError> {
    let date = date_key(now, offset)
        .ok_or_else(|| FetchError::Network(format!("offset +{}h is out of range", offset)))?;
    tracing::debug!("Fetching readings for {} (offset +{}h)", date, offset);

    let readings = source
        .fetch_readings(date)
        .await
        .map_err(|e| FetchError::Network(format!("{:#}", e)))?;

    let closest = nearest(&readings, &coord).ok_or(FetchError::NotFound { date })?;

    tracing::debug!(
        "Picked reading at {:.4},{:.4} ({:.3}° away) out of {}",
        closest.location.lat,
        closest.location.lng,
        closest.distance_degrees(&coord),
        readings.len()
    );

    Ok(Measurement::from_reading(closest, coord, offset))
}
