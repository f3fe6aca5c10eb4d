// Forecast timeline - the fixed offsets and the selected index into them
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use thiserror::Error;

/// Hours from now for which predictions are shown
pub const DEFAULT_TIME_OFFSETS: [u32; 5] = [0, 3, 6, 12, 24];

#[derive(Debug, Error, PartialEq)]
pub enum TimelineError {
    #[error("forecast timeline needs at least one time offset")]
    Empty,
    #[error("time offsets must be strictly increasing ({previous} then {next})")]
    NotIncreasing { previous: u32, next: u32 },
}

/// Ordered forecast offsets with a cursor that always stays in bounds.
/// Stepping past either end is a no-op; the cursor never wraps.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastTimeline {
    offsets: Vec<u32>,
    index: usize,
}

impl ForecastTimeline {
    pub fn new(offsets: Vec<u32>) -> Result<Self, TimelineError> {
        if offsets.is_empty() {
            return Err(TimelineError::Empty);
        }
        if let Some(pair) = offsets.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(TimelineError::NotIncreasing {
                previous: pair[0],
                next: pair[1],
            });
        }
        Ok(Self { offsets, index: 0 })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn last_index(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn current_offset(&self) -> u32 {
        self.offsets[self.index]
    }

    pub fn can_step_back(&self) -> bool {
        self.index > 0
    }

    pub fn can_step_forward(&self) -> bool {
        self.index < self.last_index()
    }

    /// Move one offset towards "now". Returns the new offset, or None at the start.
    pub fn step_back(&mut self) -> Option<u32> {
        if !self.can_step_back() {
            return None;
        }
        self.index -= 1;
        Some(self.current_offset())
    }

    /// Move one offset into the future. Returns the new offset, or None at the end.
    pub fn step_forward(&mut self) -> Option<u32> {
        if !self.can_step_forward() {
            return None;
        }
        self.index += 1;
        Some(self.current_offset())
    }

    /// Clamped explicit set. Returns true when the index actually moved.
    pub fn set_index(&mut self, index: usize) -> bool {
        let clamped = index.min(self.last_index());
        let changed = clamped != self.index;
        self.index = clamped;
        changed
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }
}

impl Default for ForecastTimeline {
    fn default() -> Self {
        Self {
            offsets: DEFAULT_TIME_OFFSETS.to_vec(),
            index: 0,
        }
    }
}

pub fn offset_label(hours: u32) -> String {
    if hours == 0 {
        "Current".to_string()
    } else {
        format!("+{}h", hours)
    }
}

/// UTC calendar date of `now + hours`; time of day is dropped.
/// None when the date falls outside the representable range.
pub fn date_key(now: DateTime<Utc>, hours: u32) -> Option<NaiveDate> {
    let delta = TimeDelta::try_hours(i64::from(hours))?;
    now.checked_add_signed(delta).map(|at| at.date_naive())
}
