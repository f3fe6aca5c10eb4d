// Time-indexed overlay - selection, forecast cursor, gesture and latest-wins measurement state
use crate::application::resolver::FetchError;
use crate::domain::coordinate::Coordinate;
use crate::domain::forecast::{offset_label, ForecastTimeline};
use crate::domain::gesture::GestureRecognizer;
use crate::domain::measurement::Measurement;
use crate::domain::severity::{classify, SeverityTier, UNKNOWN_LABEL};
use serde::{Deserialize, Serialize};

/// Notification sent to the host whenever the selected forecast offset moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OffsetChanged {
    pub offset_hours: u32,
    pub index: usize,
}

/// Work order for the resolver. The result is only accepted while
/// `generation` is still the overlay's current generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementRequest {
    pub generation: u64,
    pub coordinate: Coordinate,
    pub offset_hours: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub change: OffsetChanged,
    pub request: MeasurementRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    Down,
    Move,
    Up,
    Leave,
}

#[derive(Debug, Clone, PartialEq)]
enum DisplayState {
    Hidden,
    Loading,
    Resolved(Measurement),
    Unknown(FetchError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayStatus {
    Hidden,
    Loading,
    Resolved,
    Unknown,
}

/// Everything the host needs to draw the overlay
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayView {
    pub visible: bool,
    pub status: OverlayStatus,
    pub aqi: Option<u16>,
    pub aqi_text: String,
    pub tier: Option<SeverityTier>,
    pub label: String,
    pub color: String,
    pub offset_hours: u32,
    pub offset_index: usize,
    pub offset_label: String,
    pub can_step_back: bool,
    pub can_step_forward: bool,
    pub pollutants: Option<String>,
    pub coordinate: Option<String>,
    pub dragging: bool,
    pub error: Option<String>,
}

pub struct TimeIndexedOverlay {
    timeline: ForecastTimeline,
    gesture: GestureRecognizer,
    selection: Option<Coordinate>,
    generation: u64,
    display: DisplayState,
    reset_offset_on_select: bool,
}

impl TimeIndexedOverlay {
    pub fn new(
        timeline: ForecastTimeline,
        gesture: GestureRecognizer,
        reset_offset_on_select: bool,
    ) -> Self {
        Self {
            timeline,
            gesture,
            selection: None,
            generation: 0,
            display: DisplayState::Hidden,
            reset_offset_on_select,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn timeline(&self) -> &ForecastTimeline {
        &self.timeline
    }

    /// Latest measurement, if the current request has resolved
    pub fn measurement(&self) -> Option<&Measurement> {
        match &self.display {
            DisplayState::Resolved(m) => Some(m),
            _ => None,
        }
    }

    /// Replace (or clear) the selected coordinate. Any in-flight request
    /// is superseded either way.
    pub fn select(&mut self, coordinate: Option<Coordinate>) -> Option<MeasurementRequest> {
        self.generation += 1;
        self.gesture.pointer_up();
        self.selection = coordinate;

        match coordinate {
            None => {
                self.display = DisplayState::Hidden;
                None
            }
            Some(coordinate) => {
                if self.reset_offset_on_select {
                    self.timeline.reset();
                }
                Some(self.begin_request(coordinate))
            }
        }
    }

    pub fn pointer_down(&mut self, x: f64) {
        if self.selection.is_some() {
            self.gesture.pointer_down(x);
        }
    }

    pub fn pointer_move(&mut self, x: f64) -> Option<StepOutcome> {
        let coordinate = self.selection?;
        self.gesture.pointer_move(x, &mut self.timeline)?;
        Some(self.offset_moved(coordinate))
    }

    pub fn pointer_up(&mut self) {
        self.gesture.pointer_up();
    }

    pub fn pointer_leave(&mut self) {
        self.gesture.pointer_leave();
    }

    pub fn pointer(&mut self, kind: PointerKind, x: f64) -> Option<StepOutcome> {
        match kind {
            PointerKind::Down => {
                self.pointer_down(x);
                None
            }
            PointerKind::Move => self.pointer_move(x),
            PointerKind::Up => {
                self.pointer_up();
                None
            }
            PointerKind::Leave => {
                self.pointer_leave();
                None
            }
        }
    }

    /// Explicit offset selection, clamped to the timeline. No-op when the
    /// index does not change or nothing is selected.
    pub fn set_offset_index(&mut self, index: usize) -> Option<StepOutcome> {
        let coordinate = self.selection?;
        if !self.timeline.set_index(index) {
            return None;
        }
        Some(self.offset_moved(coordinate))
    }

    /// Accept a resolver result. Returns false when the result belongs to a
    /// superseded request and was dropped.
    pub fn apply(&mut self, generation: u64, result: Result<Measurement, FetchError>) -> bool {
        if generation != self.generation || self.selection.is_none() {
            tracing::debug!(
                "Dropping stale measurement (generation {}, current {})",
                generation,
                self.generation
            );
            return false;
        }

        self.display = match result {
            Ok(measurement) => DisplayState::Resolved(measurement),
            Err(e) => {
                tracing::warn!("Measurement unavailable: {}", e);
                DisplayState::Unknown(e)
            }
        };
        true
    }

    pub fn view(&self) -> OverlayView {
        let offset_hours = self.timeline.current_offset();
        let aqi = self.measurement().and_then(|m| m.aqi);
        let tier = aqi.map(|value| classify(i32::from(value)));

        let (status, aqi_text) = match &self.display {
            DisplayState::Hidden => (OverlayStatus::Hidden, String::new()),
            DisplayState::Loading => (OverlayStatus::Loading, "...".to_string()),
            DisplayState::Resolved(_) => (
                OverlayStatus::Resolved,
                aqi.map(|v| v.to_string())
                    .unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
            ),
            DisplayState::Unknown(_) => (OverlayStatus::Unknown, UNKNOWN_LABEL.to_string()),
        };

        OverlayView {
            visible: self.selection.is_some(),
            status,
            aqi,
            aqi_text,
            tier,
            label: tier
                .map(|t| t.label())
                .unwrap_or(UNKNOWN_LABEL)
                .to_string(),
            color: tier.unwrap_or(SeverityTier::Good).color().to_string(),
            offset_hours,
            offset_index: self.timeline.index(),
            offset_label: offset_label(offset_hours),
            can_step_back: self.timeline.can_step_back(),
            can_step_forward: self.timeline.can_step_forward(),
            pollutants: self.measurement().and_then(|m| m.pollutants.summary()),
            coordinate: self.selection.map(|c| c.label()),
            dragging: self.gesture.is_dragging(),
            error: match &self.display {
                DisplayState::Unknown(e) => Some(e.to_string()),
                _ => None,
            },
        }
    }

    fn offset_moved(&mut self, coordinate: Coordinate) -> StepOutcome {
        self.generation += 1;
        StepOutcome {
            change: OffsetChanged {
                offset_hours: self.timeline.current_offset(),
                index: self.timeline.index(),
            },
            request: self.begin_request(coordinate),
        }
    }

    // Callers bump the generation before getting here.
    fn begin_request(&mut self, coordinate: Coordinate) -> MeasurementRequest {
        self.display = DisplayState::Loading;
        MeasurementRequest {
            generation: self.generation,
            coordinate,
            offset_hours: self.timeline.current_offset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn overlay() -> TimeIndexedOverlay {
        TimeIndexedOverlay::new(ForecastTimeline::default(), GestureRecognizer::default(), true)
    }

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    fn measurement(at: Coordinate, aqi: u16) -> Measurement {
        Measurement {
            aqi: Some(aqi),
            pollutants: Default::default(),
            resolved_at: at,
            for_offset: 0,
        }
    }

    #[test]
    fn test_hidden_until_selected() {
        let overlay = overlay();
        let view = overlay.view();
        assert!(!view.visible);
        assert_eq!(view.status, OverlayStatus::Hidden);
        assert_eq!(view.coordinate, None);
    }

    #[test]
    fn test_select_issues_request_and_shows_loading() {
        let mut overlay = overlay();
        let a = coord(41.7151, 44.8271);

        let request = overlay.select(Some(a)).unwrap();
        assert_eq!(request.coordinate, a);
        assert_eq!(request.offset_hours, 0);
        assert_eq!(request.generation, overlay.generation());

        let view = overlay.view();
        assert!(view.visible);
        assert_eq!(view.status, OverlayStatus::Loading);
        assert_eq!(view.aqi_text, "...");
        assert_eq!(view.coordinate.as_deref(), Some("41.715°, 44.827°"));
        assert_eq!(view.offset_label, "Current");
    }

    #[test]
    fn test_drag_sequence_steps_and_notifies() {
        let mut overlay = overlay();
        overlay.select(Some(coord(10.0, 10.0)));

        overlay.pointer_down(200.0);
        let first = overlay.pointer_move(150.0).unwrap();
        let second = overlay.pointer_move(100.0).unwrap();
        overlay.pointer_up();

        assert_eq!(first.change.offset_hours, 3);
        assert_eq!(second.change.offset_hours, 6);
        assert_eq!(overlay.timeline().index(), 2);
        assert_eq!(second.request.offset_hours, 6);
        assert!(!overlay.view().dragging);
    }

    #[test]
    fn test_drag_past_last_offset_is_silent() {
        let mut overlay = overlay();
        overlay.select(Some(coord(10.0, 10.0)));
        overlay.set_offset_index(4);
        let generation = overlay.generation();

        overlay.pointer_down(300.0);
        assert_eq!(overlay.pointer_move(240.0), None);
        assert_eq!(overlay.timeline().index(), 4);
        assert_eq!(overlay.generation(), generation);
        assert!(!overlay.view().can_step_forward);
    }

    #[test]
    fn test_pointer_ignored_while_hidden() {
        let mut overlay = overlay();
        overlay.pointer(PointerKind::Down, 100.0);
        assert_eq!(overlay.pointer(PointerKind::Move, 0.0), None);
        assert_eq!(overlay.timeline().index(), 0);
        assert_eq!(overlay.set_offset_index(2), None);
    }

    #[test]
    fn test_reselect_resets_offset() {
        let mut overlay = overlay();
        overlay.select(Some(coord(10.0, 10.0)));
        overlay.set_offset_index(3);

        let request = overlay.select(Some(coord(11.0, 11.0))).unwrap();
        assert_eq!(request.offset_hours, 0);
        assert_eq!(overlay.timeline().index(), 0);
    }

    #[test]
    fn test_reselect_can_preserve_offset() {
        let mut overlay =
            TimeIndexedOverlay::new(ForecastTimeline::default(), GestureRecognizer::default(), false);
        overlay.select(Some(coord(10.0, 10.0)));
        overlay.set_offset_index(3);

        let request = overlay.select(Some(coord(11.0, 11.0))).unwrap();
        assert_eq!(request.offset_hours, 12);
    }

    #[test]
    fn test_stale_result_is_dropped() {
        let mut overlay = overlay();
        let a = coord(10.0, 10.0);
        let b = coord(20.0, 20.0);

        let first = overlay.select(Some(a)).unwrap();
        let second = overlay.select(Some(b)).unwrap();

        assert!(overlay.apply(second.generation, Ok(measurement(b, 180))));
        assert!(!overlay.apply(first.generation, Ok(measurement(a, 42))));

        let view = overlay.view();
        assert_eq!(view.aqi, Some(180));
        assert_eq!(view.tier, Some(SeverityTier::Unhealthy));
        assert_eq!(view.label, "Unhealthy");
    }

    #[test]
    fn test_result_after_clear_is_dropped() {
        let mut overlay = overlay();
        let a = coord(10.0, 10.0);
        let request = overlay.select(Some(a)).unwrap();
        overlay.select(None);

        assert!(!overlay.apply(request.generation, Ok(measurement(a, 42))));
        assert_eq!(overlay.view().status, OverlayStatus::Hidden);
        assert!(overlay.measurement().is_none());
    }

    #[test]
    fn test_failure_shows_unknown() {
        let mut overlay = overlay();
        let request = overlay.select(Some(coord(10.0, 10.0))).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();

        assert!(overlay.apply(request.generation, Err(FetchError::NotFound { date })));

        let view = overlay.view();
        assert_eq!(view.status, OverlayStatus::Unknown);
        assert_eq!(view.aqi, None);
        assert_eq!(view.aqi_text, "Unknown");
        assert_eq!(view.label, "Unknown");
        assert_eq!(view.color, SeverityTier::Good.color());
        assert_eq!(view.error.as_deref(), Some("no readings published for 2024-03-10"));
    }

    #[test]
    fn test_offset_change_supersedes_previous_measurement() {
        let mut overlay = overlay();
        let a = coord(10.0, 10.0);
        let request = overlay.select(Some(a)).unwrap();
        overlay.apply(request.generation, Ok(measurement(a, 42)));

        let step = overlay.set_offset_index(1).unwrap();
        assert_eq!(step.change, OffsetChanged { offset_hours: 3, index: 1 });
        assert_eq!(overlay.view().status, OverlayStatus::Loading);
        assert!(!overlay.apply(request.generation, Ok(measurement(a, 42))));
    }
}
