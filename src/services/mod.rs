pub mod database;
pub mod occupancy;
pub mod range_selector;
pub mod reservations;
pub mod validator;
