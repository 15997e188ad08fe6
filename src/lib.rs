//! Room Reservation Service
//!
//! Scheduling core for hourly room bookings: turns stored reservations into
//! an hourly occupancy map, drives the interactive start/end slot picker, and
//! validates a chosen range before it is handed to storage.
//!
//! # Modules
//!
//! - `services::occupancy`: occupancy bitmap builders
//! - `services::range_selector`: tap-driven selection state machine
//! - `services::validator`: candidate range checks
//! - `services::reservations`: create/update/delete command handlers
//! - `services::database`: the persistence collaborator trait and a CSV store
//! - `config`: environment-driven configuration
//!
//! # Hour ranges
//!
//! Booked ranges are half-open `[start, end)`. The selector shows its
//! complete selection as inclusive cells and converts it once, in
//! `SelectionRange::candidate`.

pub mod config;
pub mod error;
pub mod models;
pub mod services;


// Re-export the main API types for ease of use
pub use config::AppConfig;
pub use error::{ReservationError, SelectionError, StoreError, ValidationError};
pub use models::reservation::{HourRange, ReservationInterval, ResourceRef, UserRef};
pub use models::window::{BookableWindow, SchedulingPolicy};
pub use services::database::{open_reservation_store, CsvReservationStore, ReservationStore};
pub use services::occupancy::{build_day_occupancy, build_occupancy, OccupancyBitmap};
pub use services::range_selector::{RangeSelector, SelectionEmission, SelectionRange};
pub use services::reservations::ReservationService;
pub use services::validator::validate;
