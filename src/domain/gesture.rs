// Drag-to-step gesture recognizer for the forecast timeline
use super::forecast::ForecastTimeline;
use thiserror::Error;

/// Horizontal travel (device-independent pixels) needed for one step
pub const DEFAULT_DRAG_THRESHOLD: f64 = 40.0;

#[derive(Debug, Error, PartialEq)]
pub enum GestureError {
    #[error("drag threshold must be a finite, non-negative distance (got {0})")]
    InvalidThreshold(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureState {
    Idle,
    Dragging { anchor_x: f64 },
}

/// Relative swipe recognizer: each threshold crossing moves the timeline by
/// exactly one offset, then re-anchors so a continued drag can step again.
/// Dragging right goes back in time, dragging left goes forward.
#[derive(Debug, Clone)]
pub struct GestureRecognizer {
    threshold: f64,
    state: GestureState,
}

impl GestureRecognizer {
    pub fn new(threshold: f64) -> Result<Self, GestureError> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(GestureError::InvalidThreshold(threshold));
        }
        Ok(Self {
            threshold,
            state: GestureState::Idle,
        })
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, GestureState::Dragging { .. })
    }

    pub fn pointer_down(&mut self, x: f64) {
        self.state = GestureState::Dragging { anchor_x: x };
    }

    /// Returns the new offset when the move produced a step.
    pub fn pointer_move(&mut self, x: f64, timeline: &mut ForecastTimeline) -> Option<u32> {
        let GestureState::Dragging { anchor_x } = self.state else {
            return None;
        };

        let dx = x - anchor_x;
        if dx.abs() <= self.threshold {
            return None;
        }

        let stepped = if dx > 0.0 {
            timeline.step_back()
        } else {
            timeline.step_forward()
        };

        // Boundary drags are absorbed without moving the anchor
        if stepped.is_some() {
            self.state = GestureState::Dragging { anchor_x: x };
        }
        stepped
    }

    pub fn pointer_up(&mut self) {
        self.state = GestureState::Idle;
    }

    pub fn pointer_leave(&mut self) {
        self.state = GestureState::Idle;
    }
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_DRAG_THRESHOLD,
            state: GestureState::Idle,
        }
    }
}
