use std::fmt;

/// Why a candidate hour range cannot be booked. All are recoverable: the
/// caller re-prompts for a new selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    InvalidRange,
    OutOfWindow,
    SlotConflict,
    TooLong,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidRange => write!(f, "start hour must be before end hour"),
            ValidationError::OutOfWindow => write!(f, "range lies outside the bookable window"),
            ValidationError::SlotConflict => write!(f, "range overlaps an existing reservation"),
            ValidationError::TooLong => write!(f, "range exceeds the maximum reservation length"),
        }
    }
}

impl std::error::Error for ValidationError {}

// Taps the selector refuses; the state is left untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionError {
    OutOfWindow(u32),
    Reserved(u32),
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionError::OutOfWindow(hour) => {
                write!(f, "hour {hour} is outside the bookable window")
            }
            SelectionError::Reserved(hour) => write!(f, "hour {hour} is already reserved"),
        }
    }
}

impl std::error::Error for SelectionError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A committed reservation on the same resource overlaps the write
    Conflict { existing_id: String },
    NotFound(String),
    Io(String),
    Corrupt(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Conflict { existing_id } => {
                write!(f, "conflict with reservation: {existing_id}")
            }
            StoreError::NotFound(id) => write!(f, "reservation not found: {id}"),
            StoreError::Io(e) => write!(f, "storage error: {e}"),
            StoreError::Corrupt(e) => write!(f, "corrupt reservation record: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservationError {
    Rejected(ValidationError),
    /// The occupancy used for validation went stale before commit; rebuild it
    /// and select again.
    ConcurrentConflict(String),
    NotFound(String),
    Storage(String),
}

impl fmt::Display for ReservationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReservationError::Rejected(reason) => write!(f, "reservation rejected: {reason}"),
            ReservationError::ConcurrentConflict(id) => write!(
                f,
                "reservation {id} was committed concurrently; selection is stale"
            ),
            ReservationError::NotFound(id) => write!(f, "reservation not found: {id}"),
            ReservationError::Storage(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ReservationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReservationError::Rejected(reason) => Some(reason),
            _ => None,
        }
    }
}

impl From<ValidationError> for ReservationError {
    fn from(reason: ValidationError) -> Self {
        ReservationError::Rejected(reason)
    }
}

impl From<StoreError> for ReservationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { existing_id } => ReservationError::ConcurrentConflict(existing_id),
            StoreError::NotFound(id) => ReservationError::NotFound(id),
            other @ (StoreError::Io(_) | StoreError::Corrupt(_)) => {
                ReservationError::Storage(other.to_string())
            }
        }
    }
}
