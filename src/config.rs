use chrono::FixedOffset;
use dotenv::dotenv;
use std::env;
use std::str::FromStr;
use tracing::info;

use crate::models::window::{BookableWindow, SchedulingPolicy};

pub const DEFAULT_DATABASE_PATH: &str = "data/reservations.csv";

/// Runtime configuration, read from the environment (and `.env` if present).
///
/// | variable | default |
/// |---|---|
/// | `RESERVATION_DATABASE_PATH` | `data/reservations.csv` |
/// | `BOOKABLE_START_HOUR` | `9` |
/// | `BOOKABLE_END_HOUR` | `18` |
/// | `MAX_RESERVATION_HOURS` | `4` |
/// | `RESERVATION_UTC_OFFSET_HOURS` | `0` |
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: String,
    pub policy: SchedulingPolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = lookup("RESERVATION_DATABASE_PATH")
            .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());

        let start_hour = parse_or(&lookup, "BOOKABLE_START_HOUR", 9u32)?;
        let end_hour = parse_or(&lookup, "BOOKABLE_END_HOUR", 18u32)?;
        let max_duration_hours = parse_or(&lookup, "MAX_RESERVATION_HOURS", 4u32)?;
        let offset_hours = parse_or(&lookup, "RESERVATION_UTC_OFFSET_HOURS", 0i32)?;

        let window = BookableWindow::new(start_hour, end_hour)?;
        if max_duration_hours == 0 {
            return Err("MAX_RESERVATION_HOURS must be at least 1".to_string());
        }
        let utc_offset = offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                format!(
                    "RESERVATION_UTC_OFFSET_HOURS={} is not a valid offset",
                    offset_hours
                )
            })?;

        info!(
            "Bookable window {}, max {} hours per reservation, UTC offset {}",
            window, max_duration_hours, utc_offset
        );

        Ok(Self {
            database_path,
            policy: SchedulingPolicy::new(window, max_duration_hours).with_utc_offset(utc_offset),
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, String>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| format!("Invalid value '{}' for {}: {}", raw, name, e)),
        None => Ok(default),
    }
}
