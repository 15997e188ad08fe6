use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

// Reference to the bookable resource (a room)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceRef(pub String);

// Reference to the user owning a reservation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRef(pub String);

impl ResourceRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl UserRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceRef {
    fn from(value: &str) -> Self {
        ResourceRef(value.to_string())
    }
}

impl From<&str> for UserRef {
    fn from(value: &str) -> Self {
        UserRef(value.to_string())
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for UserRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored reservation of a resource.
///
/// Both instants are expected on hour boundaries of the canonical timezone,
/// with `start_time < end_time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationInterval {
    pub id: String,
    pub resource_id: ResourceRef,
    pub owner_id: UserRef,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl ReservationInterval {
    pub fn overlaps(&self, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> bool {
        self.start_time < end_time && start_time < self.end_time
    }
}

// Reservation handed to the store for creation; the store assigns the id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    pub resource_id: ResourceRef,
    pub owner_id: UserRef,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Half-open hour range `[start, end)` within a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourRange {
    pub start: u32,
    pub end: u32,
}

impl HourRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Booked hours; zero for empty or inverted ranges
    pub fn duration_hours(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn hours(&self) -> Range<u32> {
        self.start..self.end
    }

    // Label in the form "2035-03-30 09:00-11:00"
    pub fn label(&self, date: NaiveDate) -> String {
        format!("{} {}", date.format("%Y-%m-%d"), self)
    }
}

impl fmt::Display for HourRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00-{:02}:00", self.start, self.end)
    }
}
