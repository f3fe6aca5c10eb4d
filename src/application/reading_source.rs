// Source trait for remote air-quality readings
use crate::domain::reading::GeoReading;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

/// Dataset summary reported by the remote API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceStats {
    pub time_range: TimeRange,
    pub total_records: u64,
    #[serde(rename = "avgAQI")]
    pub avg_aqi: f64,
}

#[async_trait]
pub trait ReadingSource: Send + Sync {
    /// All readings published for a calendar date
    async fn fetch_readings(&self, date: NaiveDate) -> anyhow::Result<Vec<GeoReading>>;

    /// True when the remote API reports itself healthy
    async fn health(&self) -> anyhow::Result<bool>;

    async fn stats(&self) -> anyhow::Result<SourceStats>;
}
