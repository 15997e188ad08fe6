use tracing::{debug, warn};

use crate::error::ValidationError;
use crate::models::reservation::HourRange;
use crate::models::window::SchedulingPolicy;
use crate::services::occupancy::OccupancyBitmap;

/// Check a half-open candidate range against an occupancy snapshot.
///
/// Checks run in a fixed order: range shape, window bounds, conflicts, then
/// length. The candidate must also lie inside the window the occupancy was
/// built for. On success the candidate is returned for the command handler.
pub fn validate(
    policy: &SchedulingPolicy,
    occupancy: &OccupancyBitmap,
    candidate: HourRange,
) -> Result<HourRange, ValidationError> {
    let window = policy.window;

    if candidate.start >= candidate.end {
        return Err(ValidationError::InvalidRange);
    }

    if candidate.start < window.start_hour() || candidate.end > window.end_hour() {
        debug!("Candidate {} falls outside window {}", candidate, window);
        return Err(ValidationError::OutOfWindow);
    }

    // The snapshot must cover every candidate hour
    let covered = occupancy.window();
    if candidate.start < covered.start_hour() || candidate.end > covered.end_hour() {
        warn!(
            "Candidate {} falls outside the occupancy snapshot window {}",
            candidate, covered
        );
        return Err(ValidationError::OutOfWindow);
    }

    if let Some(hour) = occupancy.first_occupied(candidate.hours()) {
        debug!("Candidate {} conflicts at hour {}", candidate, hour);
        return Err(ValidationError::SlotConflict);
    }

    if candidate.duration_hours() > policy.max_duration_hours {
        return Err(ValidationError::TooLong);
    }

    Ok(candidate)
}
