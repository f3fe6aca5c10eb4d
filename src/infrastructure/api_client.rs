// HTTP client for the air-quality data API
use crate::application::reading_source::{ReadingSource, SourceStats};
use crate::domain::reading::GeoReading;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct HttpReadingSource {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

impl HttpReadingSource {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn data_url(&self, date: NaiveDate) -> String {
        let timestamp = date.format("%Y-%m-%d").to_string();
        format!(
            "{}/data?timestamp={}",
            self.base_url,
            urlencoding::encode(&timestamp)
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to air-quality API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Air-quality API request failed with status {}: {}", status, body);
        }

        response
            .json::<T>()
            .await
            .context("Failed to parse air-quality API response")
    }
}

#[async_trait]
impl ReadingSource for HttpReadingSource {
    async fn fetch_readings(&self, date: NaiveDate) -> Result<Vec<GeoReading>> {
        let readings: Vec<GeoReading> = self.get_json(&self.data_url(date)).await?;
        tracing::debug!("Received {} readings for {}", readings.len(), date);
        Ok(readings)
    }

    async fn health(&self) -> Result<bool> {
        let health: HealthResponse = self.get_json(&self.url("health")).await?;
        Ok(health.status == "healthy")
    }

    async fn stats(&self) -> Result<SourceStats> {
        self.get_json(&self.url("stats")).await
    }
}
