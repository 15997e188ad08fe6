use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use serde::Serialize;
use std::fmt;
use std::ops::Range;

/// Daily hour range during which a resource accepts reservations.
///
/// Hours are whole hours of the day, `end_hour` exclusive: the default
/// window `9..18` offers the slots 09:00 through 17:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BookableWindow {
    start_hour: u32,
    end_hour: u32,
}

impl BookableWindow {
    pub fn new(start_hour: u32, end_hour: u32) -> Result<Self, String> {
        if start_hour >= end_hour {
            return Err(format!(
                "Invalid bookable window {}..{}: start hour must be before end hour",
                start_hour, end_hour
            ));
        }
        if end_hour > 24 {
            return Err(format!(
                "Invalid bookable window {}..{}: end hour must not exceed 24",
                start_hour, end_hour
            ));
        }

        Ok(Self {
            start_hour,
            end_hour,
        })
    }

    pub fn start_hour(&self) -> u32 {
        self.start_hour
    }

    pub fn end_hour(&self) -> u32 {
        self.end_hour
    }

    /// Number of hourly slots in the window
    pub fn len(&self) -> usize {
        (self.end_hour - self.start_hour) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, hour: u32) -> bool {
        hour >= self.start_hour && hour < self.end_hour
    }

    pub fn hours(&self) -> Range<u32> {
        self.start_hour..self.end_hour
    }

    /// Slot index of `hour`, if the hour lies inside the window
    pub fn index_of(&self, hour: u32) -> Option<usize> {
        if self.contains(hour) {
            Some((hour - self.start_hour) as usize)
        } else {
            None
        }
    }
}

impl Default for BookableWindow {
    fn default() -> Self {
        Self {
            start_hour: 9,
            end_hour: 18,
        }
    }
}

impl fmt::Display for BookableWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00-{:02}:00", self.start_hour, self.end_hour)
    }
}

/// Scheduling rules applied to every occupancy, selection and validation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulingPolicy {
    pub window: BookableWindow,
    pub max_duration_hours: u32,
    /// Offset of the canonical timezone that hour-of-day is read in
    pub utc_offset: FixedOffset,
}

impl SchedulingPolicy {
    pub fn new(window: BookableWindow, max_duration_hours: u32) -> Self {
        Self {
            window,
            max_duration_hours,
            utc_offset: Utc.fix(),
        }
    }

    pub fn with_utc_offset(mut self, utc_offset: FixedOffset) -> Self {
        self.utc_offset = utc_offset;
        self
    }

    /// Instant of local midnight on `date`
    pub fn midnight(&self, date: NaiveDate) -> DateTime<Utc> {
        local_midnight(date, self.utc_offset)
    }

    /// Instant at which local `hour` of `date` starts. Hour 24 is the next midnight.
    pub fn instant_at(&self, date: NaiveDate, hour: u32) -> DateTime<Utc> {
        self.midnight(date) + Duration::hours(hour as i64)
    }

    /// Local calendar date of an instant
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.utc_offset).date_naive()
    }
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self::new(BookableWindow::default(), 4)
    }
}

pub fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    Utc.from_utc_datetime(&naive) - Duration::seconds(offset.local_minus_utc() as i64)
}
