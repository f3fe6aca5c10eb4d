// Overlay service - drives the overlay and resolves its measurement requests
use crate::application::overlay::{
    MeasurementRequest, OffsetChanged, OverlayView, PointerKind, StepOutcome, TimeIndexedOverlay,
};
use crate::application::reading_source::{ReadingSource, SourceStats};
use crate::application::resolver::{fetch_measurement, FetchError, ResolverMode};
use crate::domain::coordinate::Coordinate;
use crate::domain::measurement::Measurement;
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

const OFFSET_CHANNEL_CAPACITY: usize = 32;

/// View right after an operation, plus the fetch it started (if any)
pub struct OverlayUpdate {
    pub view: OverlayView,
    pending: Option<JoinHandle<()>>,
}

impl OverlayUpdate {
    /// Wait for the started fetch to finish (and be applied or dropped)
    pub async fn settled(self) {
        if let Some(handle) = self.pending {
            if let Err(e) = handle.await {
                tracing::error!("Measurement fetch task failed: {}", e);
            }
        }
    }
}

#[derive(Clone)]
pub struct OverlayService {
    overlay: Arc<Mutex<TimeIndexedOverlay>>,
    source: Arc<dyn ReadingSource>,
    mode: ResolverMode,
    fetch_timeout: Duration,
    offsets_tx: broadcast::Sender<OffsetChanged>,
}

impl OverlayService {
    pub fn new(
        overlay: TimeIndexedOverlay,
        source: Arc<dyn ReadingSource>,
        mode: ResolverMode,
        fetch_timeout: Duration,
    ) -> Self {
        let (offsets_tx, _) = broadcast::channel(OFFSET_CHANNEL_CAPACITY);
        Self {
            overlay: Arc::new(Mutex::new(overlay)),
            source,
            mode,
            fetch_timeout,
            offsets_tx,
        }
    }

    /// Offset-changed notifications; dropping the receiver ends the subscription
    pub fn subscribe(&self) -> broadcast::Receiver<OffsetChanged> {
        self.offsets_tx.subscribe()
    }

    pub fn view(&self) -> OverlayView {
        self.lock().view()
    }

    pub fn select(&self, coordinate: Option<Coordinate>) -> OverlayUpdate {
        let request = self.lock().select(coordinate);
        match coordinate {
            Some(c) => tracing::debug!("Selected {}", c.label()),
            None => tracing::debug!("Selection cleared"),
        }
        self.dispatch(request)
    }

    pub fn pointer(&self, kind: PointerKind, x: f64) -> OverlayUpdate {
        let mut overlay = self.lock();
        let outcome = overlay.pointer(kind, x);
        self.step(overlay, outcome)
    }

    pub fn set_offset_index(&self, index: usize) -> OverlayUpdate {
        let mut overlay = self.lock();
        let outcome = overlay.set_offset_index(index);
        self.step(overlay, outcome)
    }

    pub async fn upstream_health(&self) -> anyhow::Result<bool> {
        self.source.health().await
    }

    pub async fn upstream_stats(&self) -> anyhow::Result<SourceStats> {
        self.source.stats().await
    }

    fn lock(&self) -> MutexGuard<'_, TimeIndexedOverlay> {
        self.overlay.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn step(
        &self,
        overlay: MutexGuard<'_, TimeIndexedOverlay>,
        outcome: Option<StepOutcome>,
    ) -> OverlayUpdate {
        let Some(outcome) = outcome else {
            return OverlayUpdate {
                view: overlay.view(),
                pending: None,
            };
        };

        tracing::debug!(
            "Time offset changed to +{}h (index {})",
            outcome.change.offset_hours,
            outcome.change.index
        );
        // Published under the overlay lock so events keep the order of index changes.
        // No subscribers is fine.
        let _ = self.offsets_tx.send(outcome.change);
        drop(overlay);

        self.dispatch(Some(outcome.request))
    }

    fn dispatch(&self, request: Option<MeasurementRequest>) -> OverlayUpdate {
        let Some(request) = request else {
            return OverlayUpdate {
                view: self.view(),
                pending: None,
            };
        };

        match self.mode {
            ResolverMode::Local => {
                let measurement = Measurement::estimated(request.coordinate, request.offset_hours);
                let mut overlay = self.lock();
                overlay.apply(request.generation, Ok(measurement));
                OverlayUpdate {
                    view: overlay.view(),
                    pending: None,
                }
            }
            ResolverMode::Remote => {
                let overlay = self.overlay.clone();
                let source = self.source.clone();
                let fetch_timeout = self.fetch_timeout;

                let handle = tokio::spawn(async move {
                    let fetch = fetch_measurement(
                        source.as_ref(),
                        request.coordinate,
                        request.offset_hours,
                        Utc::now(),
                    );
                    let result = match tokio::time::timeout(fetch_timeout, fetch).await {
                        Ok(result) => result,
                        Err(_) => Err(FetchError::Network(format!(
                            "timed out after {}ms",
                            fetch_timeout.as_millis()
                        ))),
                    };

                    overlay
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .apply(request.generation, result);
                });

                OverlayUpdate {
                    view: self.view(),
                    pending: Some(handle),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::overlay::OverlayStatus;
    use crate::application::test_support::{reading, GatedSource, StaticSource};
    use crate::domain::forecast::ForecastTimeline;
    use crate::domain::gesture::GestureRecognizer;
    use crate::domain::measurement::compute_aqi;
    use tokio::sync::broadcast::error::TryRecvError;

    fn service(source: Arc<dyn ReadingSource>, mode: ResolverMode, timeout: Duration) -> OverlayService {
        let overlay =
            TimeIndexedOverlay::new(ForecastTimeline::default(), GestureRecognizer::default(), true);
        OverlayService::new(overlay, source, mode, timeout)
    }

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    #[tokio::test]
    async fn test_local_mode_resolves_inline() {
        let svc = service(
            Arc::new(StaticSource::new(vec![])),
            ResolverMode::Local,
            Duration::from_secs(5),
        );
        let a = coord(41.7151, 44.8271);

        let update = svc.select(Some(a));
        assert_eq!(update.view.status, OverlayStatus::Resolved);
        assert_eq!(update.view.aqi, Some(compute_aqi(&a, 0)));

        // same input, same output
        let again = svc.select(Some(a));
        assert_eq!(again.view.aqi, update.view.aqi);
    }

    #[tokio::test]
    async fn test_gesture_publishes_offsets() {
        let svc = service(
            Arc::new(StaticSource::new(vec![])),
            ResolverMode::Local,
            Duration::from_secs(5),
        );
        let mut rx = svc.subscribe();
        svc.select(Some(coord(10.0, 10.0)));

        svc.pointer(PointerKind::Down, 200.0);
        svc.pointer(PointerKind::Move, 150.0);
        let update = svc.pointer(PointerKind::Move, 100.0);
        svc.pointer(PointerKind::Up, 100.0);

        assert_eq!(update.view.offset_index, 2);
        assert_eq!(update.view.offset_hours, 6);
        assert_eq!(rx.try_recv().unwrap().offset_hours, 3);
        assert_eq!(rx.try_recv().unwrap().offset_hours, 6);
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn test_boundary_drag_publishes_nothing() {
        let svc = service(
            Arc::new(StaticSource::new(vec![])),
            ResolverMode::Local,
            Duration::from_secs(5),
        );
        svc.select(Some(coord(10.0, 10.0)));
        svc.set_offset_index(4);
        let mut rx = svc.subscribe();

        svc.pointer(PointerKind::Down, 300.0);
        let update = svc.pointer(PointerKind::Move, 200.0);

        assert_eq!(update.view.offset_index, 4);
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn test_remote_fetch_applies_nearest_reading() {
        let source = Arc::new(StaticSource::new(vec![
            reading(10.5, 10.0, 40.0),
            reading(10.0, 10.1, 120.0),
        ]));
        let svc = service(source, ResolverMode::Remote, Duration::from_secs(5));

        let update = svc.select(Some(coord(10.0, 10.0)));
        assert_eq!(update.view.status, OverlayStatus::Loading);
        update.settled().await;

        let view = svc.view();
        assert_eq!(view.status, OverlayStatus::Resolved);
        assert_eq!(view.aqi, Some(120));
        assert_eq!(view.pollutants.as_deref(), Some("PM2.5: 48"));
    }

    #[tokio::test]
    async fn test_slow_stale_response_does_not_clobber_fresh_one() {
        let source = Arc::new(GatedSource::new());
        let svc = service(source.clone(), ResolverMode::Remote, Duration::from_secs(5));

        let first = svc.select(Some(coord(10.0, 10.0)));
        source.wait_for_requests(1).await;
        let second = svc.select(Some(coord(20.0, 20.0)));
        source.wait_for_requests(2).await;

        // generation 2 answers first
        source.release(1, vec![reading(20.0, 20.0, 180.0)]);
        second.settled().await;
        assert_eq!(svc.view().aqi, Some(180));

        source.release(0, vec![reading(10.0, 10.0, 42.0)]);
        first.settled().await;

        let view = svc.view();
        assert_eq!(view.aqi, Some(180));
        assert_eq!(view.coordinate.as_deref(), Some("20.000°, 20.000°"));
    }

    #[tokio::test]
    async fn test_empty_source_shows_unknown() {
        let svc = service(
            Arc::new(StaticSource::new(vec![])),
            ResolverMode::Remote,
            Duration::from_secs(5),
        );

        svc.select(Some(coord(10.0, 10.0))).settled().await;

        let view = svc.view();
        assert_eq!(view.status, OverlayStatus::Unknown);
        assert_eq!(view.aqi_text, "Unknown");
    }

    #[tokio::test]
    async fn test_timeout_shows_unknown() {
        let source = Arc::new(GatedSource::new());
        let svc = service(source, ResolverMode::Remote, Duration::from_millis(20));

        svc.select(Some(coord(10.0, 10.0))).settled().await;

        let view = svc.view();
        assert_eq!(view.status, OverlayStatus::Unknown);
        assert!(view.error.unwrap().contains("timed out after 20ms"));
    }

    #[tokio::test]
    async fn test_clear_selection_hides_overlay() {
        let svc = service(
            Arc::new(StaticSource::new(vec![])),
            ResolverMode::Local,
            Duration::from_secs(5),
        );
        svc.select(Some(coord(10.0, 10.0)));

        let update = svc.select(None);
        assert!(!update.view.visible);
        assert_eq!(update.view.status, OverlayStatus::Hidden);
    }

    #[tokio::test]
    async fn test_out_of_range_offset_shows_unknown() {
        let overlay = TimeIndexedOverlay::new(
            ForecastTimeline::new(vec![0, u32::MAX]).unwrap(),
            GestureRecognizer::default(),
            true,
        );
        let svc = OverlayService::new(
            overlay,
            Arc::new(StaticSource::new(vec![reading(10.0, 10.0, 50.0)])),
            ResolverMode::Remote,
            Duration::from_secs(5),
        );
        svc.select(Some(coord(10.0, 10.0))).settled().await;

        let update = svc.set_offset_index(1);
        assert_eq!(update.view.status, OverlayStatus::Loading);
        update.settled().await;

        let view = svc.view();
        assert_eq!(view.status, OverlayStatus::Unknown);
        assert!(view.error.unwrap().contains("out of range"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_offset_changes_publish_in_order() {
        let svc = service(
            Arc::new(StaticSource::new(vec![])),
            ResolverMode::Local,
            Duration::from_secs(5),
        );
        svc.select(Some(coord(10.0, 10.0)));
        let mut rx = svc.subscribe();

        let tasks: Vec<_> = (0..200)
            .map(|i| {
                let svc = svc.clone();
                tokio::spawn(async move {
                    svc.set_offset_index(if i % 2 == 0 { 1 } else { 3 });
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let mut last = None;
        loop {
            match rx.try_recv() {
                Ok(change) => last = Some(change),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }

        let view = svc.view();
        let last = last.unwrap();
        assert_eq!(last.index, view.offset_index);
        assert_eq!(last.offset_hours, view.offset_hours);
    }
}
