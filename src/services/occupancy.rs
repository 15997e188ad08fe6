use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

use crate::models::reservation::ReservationInterval;
use crate::models::window::{local_midnight, BookableWindow, SchedulingPolicy};

const SECONDS_PER_HOUR: i64 = 3600;

/// Hourly busy/free map of a resource over its bookable window.
///
/// Slot `i` stands for hour `window.start_hour() + i`; `1` means at least one
/// reservation covers that hour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OccupancyBitmap {
    window: BookableWindow,
    slots: Vec<u8>,
}

impl OccupancyBitmap {
    pub fn empty(window: BookableWindow) -> Self {
        Self {
            window,
            slots: vec![0; window.len()],
        }
    }

    pub fn window(&self) -> BookableWindow {
        self.window
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.slots
    }

    /// Mark `hour` busy. Returns false when the hour is outside the window.
    pub fn mark(&mut self, hour: u32) -> bool {
        match self.window.index_of(hour) {
            Some(idx) => {
                self.slots[idx] = 1;
                true
            }
            None => false,
        }
    }

    /// Hours outside the window are never occupied
    pub fn is_occupied(&self, hour: u32) -> bool {
        self.window
            .index_of(hour)
            .map_or(false, |idx| self.slots[idx] == 1)
    }

    /// Number of free in-window hours among `hours`
    pub fn count_free<I>(&self, hours: I) -> u32
    where
        I: IntoIterator<Item = u32>,
    {
        hours
            .into_iter()
            .filter(|&h| self.window.contains(h) && !self.is_occupied(h))
            .count() as u32
    }

    pub fn first_occupied<I>(&self, hours: I) -> Option<u32>
    where
        I: IntoIterator<Item = u32>,
    {
        hours.into_iter().find(|&h| self.is_occupied(h))
    }

    pub fn free_hours(&self) -> Vec<u32> {
        self.window.hours().filter(|&h| !self.is_occupied(h)).collect()
    }

    pub fn occupied_hours(&self) -> Vec<u32> {
        self.window.hours().filter(|&h| self.is_occupied(h)).collect()
    }

    // Mark the half-open hour span [from, to), clipped to the window
    fn mark_span(&mut self, interval_id: &str, from: i64, to: i64) {
        let lo = from.max(self.window.start_hour() as i64);
        let hi = to.min(self.window.end_hour() as i64);

        if lo >= hi {
            return;
        }
        if lo != from || hi != to {
            debug!(
                "Reservation {} spans hours {}..{}, clipped to {}..{} of window {}",
                interval_id, from, to, lo, hi, self.window
            );
        }

        for hour in lo..hi {
            self.mark(hour as u32);
        }
    }
}

impl fmt::Display for OccupancyBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for slot in &self.slots {
            write!(f, "{}", slot)?;
        }
        Ok(())
    }
}

/// Hour span `[from, to)` covered by an interval, counted from `midnight`.
///
/// Start is floored and end ceiled, so an off-boundary instant marks every
/// hour it touches.
fn covered_hours(interval: &ReservationInterval, midnight: DateTime<Utc>) -> (i64, i64) {
    let start_secs = (interval.start_time - midnight).num_seconds();
    let end_secs = (interval.end_time - midnight).num_seconds();

    let from = start_secs.div_euclid(SECONDS_PER_HOUR);
    let to = -((-end_secs).div_euclid(SECONDS_PER_HOUR));
    (from, to)
}

fn is_well_formed(interval: &ReservationInterval) -> bool {
    if interval.start_time >= interval.end_time {
        warn!(
            "Ignoring reservation {} with start {} not before end {}",
            interval.id, interval.start_time, interval.end_time
        );
        return false;
    }
    true
}

/// Build the occupancy of `window` from reservation intervals, reading
/// hour-of-day in UTC.
///
/// Intervals may be unsorted and may overlap. Each interval is measured from
/// the midnight of its own start date.
pub fn build_occupancy(window: &BookableWindow, intervals: &[ReservationInterval]) -> OccupancyBitmap {
    build_occupancy_in(window, Utc.fix(), intervals)
}

/// Same as [`build_occupancy`], reading hour-of-day at a fixed UTC offset
pub fn build_occupancy_in(
    window: &BookableWindow,
    offset: FixedOffset,
    intervals: &[ReservationInterval],
) -> OccupancyBitmap {
    let mut bitmap = OccupancyBitmap::empty(*window);

    for interval in intervals.iter().filter(|i| is_well_formed(i)) {
        let date = interval.start_time.with_timezone(&offset).date_naive();
        let (from, to) = covered_hours(interval, local_midnight(date, offset));
        bitmap.mark_span(&interval.id, from, to);
    }

    bitmap
}

/// Occupancy of a single calendar day.
///
/// Only the part of each interval falling on `date` contributes, so an
/// interval crossing midnight marks the right hours on both days. The
/// reservation named by `exclude` is skipped, which lets an edited
/// reservation be validated against everything but itself.
pub fn build_day_occupancy(
    policy: &SchedulingPolicy,
    date: NaiveDate,
    intervals: &[ReservationInterval],
    exclude: Option<&str>,
) -> OccupancyBitmap {
    let midnight = policy.midnight(date);
    let mut bitmap = OccupancyBitmap::empty(policy.window);

    for interval in intervals
        .iter()
        .filter(|i| exclude.map_or(true, |id| i.id != id))
        .filter(|i| is_well_formed(i))
    {
        let (from, to) = covered_hours(interval, midnight);
        bitmap.mark_span(&interval.id, from, to);
    }

    debug!(
        "Built occupancy {} for {} from {} reservations",
        bitmap,
        date,
        intervals.len()
    );

    bitmap
}
