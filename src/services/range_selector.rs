use serde::Serialize;
use tracing::debug;

use crate::error::SelectionError;
use crate::models::reservation::HourRange;
use crate::models::window::SchedulingPolicy;
use crate::services::occupancy::OccupancyBitmap;

/// In-progress choice of hour cells during an interactive booking session.
///
/// `Complete { start, end }` names the first and last selected cells, both
/// inclusive, with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SelectionRange {
    #[default]
    Empty,
    Partial {
        start: u32,
    },
    Complete {
        start: u32,
        end: u32,
    },
}

impl SelectionRange {
    pub fn is_selected(&self, hour: u32) -> bool {
        match *self {
            SelectionRange::Empty => false,
            SelectionRange::Partial { start } => hour == start,
            SelectionRange::Complete { start, end } => start <= hour && hour <= end,
        }
    }

    /// Booking candidate for a complete selection.
    ///
    /// This is the one place the inclusive cell range becomes a half-open
    /// booking range: cells `9..=11` book `[9, 12)`.
    pub fn candidate(&self) -> Option<HourRange> {
        match *self {
            SelectionRange::Complete { start, end } => Some(HourRange::new(start, end + 1)),
            _ => None,
        }
    }
}

/// What the selector reports to its owner after each accepted tap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEmission {
    Selected { start: u32, end: u32 },
    Cleared,
}

impl SelectionEmission {
    pub fn as_pair(&self) -> (Option<u32>, Option<u32>) {
        match *self {
            SelectionEmission::Selected { start, end } => (Some(start), Some(end)),
            SelectionEmission::Cleared => (None, None),
        }
    }
}

/// Tap-driven start/end picker over an occupancy snapshot.
pub struct RangeSelector {
    occupancy: OccupancyBitmap,
    max_duration_hours: u32,
    state: SelectionRange,
}

impl RangeSelector {
    pub fn new(occupancy: OccupancyBitmap, policy: &SchedulingPolicy) -> Self {
        Self {
            occupancy,
            max_duration_hours: policy.max_duration_hours,
            state: SelectionRange::Empty,
        }
    }

    pub fn state(&self) -> SelectionRange {
        self.state
    }

    pub fn occupancy(&self) -> &OccupancyBitmap {
        &self.occupancy
    }

    /// Whether the host surface should let the user tap `hour`
    pub fn is_tappable(&self, hour: u32) -> bool {
        self.occupancy.window().contains(hour) && !self.occupancy.is_occupied(hour)
    }

    pub fn is_selected(&self, hour: u32) -> bool {
        self.state.is_selected(hour)
    }

    pub fn candidate(&self) -> Option<HourRange> {
        self.state.candidate()
    }

    /// Handle a tap on `hour`.
    ///
    /// Reserved and out-of-window hours are refused without touching the
    /// current selection.
    pub fn tap(&mut self, hour: u32) -> Result<SelectionEmission, SelectionError> {
        if !self.occupancy.window().contains(hour) {
            return Err(SelectionError::OutOfWindow(hour));
        }
        if self.occupancy.is_occupied(hour) {
            return Err(SelectionError::Reserved(hour));
        }

        self.state = match self.state {
            SelectionRange::Partial { start } if hour > start => {
                let free = self.occupancy.count_free(start..=hour);
                if free <= self.max_duration_hours {
                    SelectionRange::Complete { start, end: hour }
                } else {
                    debug!(
                        "Selection {}..={} has {} free hours, over the {} hour limit; restarting at {}",
                        start, hour, free, self.max_duration_hours, hour
                    );
                    SelectionRange::Partial { start: hour }
                }
            }
            _ => SelectionRange::Partial { start: hour },
        };

        Ok(self.emission())
    }

    /// Drop any selection
    pub fn reset(&mut self) -> SelectionEmission {
        self.state = SelectionRange::Empty;
        SelectionEmission::Cleared
    }

    /// Swap in a freshly built occupancy, e.g. after a concurrent conflict.
    /// The selection is discarded since it was made against the old snapshot.
    pub fn refresh(&mut self, occupancy: OccupancyBitmap) -> SelectionEmission {
        self.occupancy = occupancy;
        self.reset()
    }

    fn emission(&self) -> SelectionEmission {
        match self.state {
            SelectionRange::Complete { start, end } => SelectionEmission::Selected { start, end },
            _ => SelectionEmission::Cleared,
        }
    }
}
