// Fake reading sources shared by the application tests
use crate::application::reading_source::{ReadingSource, SourceStats, TimeRange};
use crate::domain::reading::{GeoPoint, GeoReading, Pollutants};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Mutex;
use tokio::sync::oneshot;

pub fn reading(lat: f64, lng: f64, aqi: f64) -> GeoReading {
    GeoReading {
        timestamp: "2024-03-10T12:00:00Z".to_string(),
        location: GeoPoint { lat, lng },
        aqi,
        pollutants: Pollutants {
            pm25: Some(aqi / 2.5),
            ..Pollutants::default()
        },
    }
}

/// Answers every request immediately with the same readings (or error)
pub struct StaticSource {
    readings: Vec<GeoReading>,
    failure: Option<String>,
    dates: Mutex<Vec<String>>,
}

impl StaticSource {
    pub fn new(readings: Vec<GeoReading>) -> Self {
        Self {
            readings,
            failure: None,
            dates: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            readings: Vec::new(),
            failure: Some(message.to_string()),
            dates: Mutex::new(Vec::new()),
        }
    }

    pub fn requested_dates(&self) -> Vec<String> {
        self.dates.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReadingSource for StaticSource {
    async fn fetch_readings(&self, date: NaiveDate) -> anyhow::Result<Vec<GeoReading>> {
        self.dates.lock().unwrap().push(date.to_string());
        match &self.failure {
            Some(message) => anyhow::bail!("{}", message),
            None => Ok(self.readings.clone()),
        }
    }

    async fn health(&self) -> anyhow::Result<bool> {
        Ok(self.failure.is_none())
    }

    async fn stats(&self) -> anyhow::Result<SourceStats> {
        Ok(SourceStats {
            time_range: TimeRange {
                start: "2024-03-01".to_string(),
                end: "2024-03-31".to_string(),
            },
            total_records: self.readings.len() as u64,
            avg_aqi: 0.0,
        })
    }
}

type Gate = oneshot::Sender<anyhow::Result<Vec<GeoReading>>>;

/// Holds every request open until the test releases it, so response
/// order can be controlled independently of request order.
#[derive(Default)]
pub struct GatedSource {
    gates: Mutex<Vec<Option<Gate>>>,
}

impl GatedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests received so far
    pub fn received(&self) -> usize {
        self.gates.lock().unwrap().len()
    }

    pub fn release(&self, call: usize, readings: Vec<GeoReading>) {
        let gate = self.gates.lock().unwrap()[call].take();
        if let Some(tx) = gate {
            let _ = tx.send(Ok(readings));
        }
    }

    pub async fn wait_for_requests(&self, count: usize) {
        while self.received() < count {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl ReadingSource for GatedSource {
    async fn fetch_readings(&self, _date: NaiveDate) -> anyhow::Result<Vec<GeoReading>> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push(Some(tx));
        rx.await?
    }

    async fn health(&self) -> anyhow::Result<bool> {
        Ok(true)
    }

    async fn stats(&self) -> anyhow::Result<SourceStats> {
        anyhow::bail!("stats not available")
    }
}
