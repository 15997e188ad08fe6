use std::env;
use std::process;

use chrono::NaiveDate;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use room_reservation_service::{
    open_reservation_store, validate, AppConfig, CsvReservationStore, HourRange,
    ReservationService, ResourceRef, SelectionEmission, UserRef,
};

const USAGE: &str = "usage:
  room-reservations occupancy <resource> <YYYY-MM-DD>
  room-reservations owner <owner> <YYYY-MM-DD>
  room-reservations select <resource> <YYYY-MM-DD> <hour>...
  room-reservations book <resource> <owner> <YYYY-MM-DD> <start-hour> <end-hour>
  room-reservations move <reservation-id> <YYYY-MM-DD> <start-hour> <end-hour>
  room-reservations cancel <reservation-id>";

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{}': {}", raw, e))
}

fn parse_hour(raw: &str) -> Result<u32, String> {
    raw.parse::<u32>()
        .map_err(|e| format!("Invalid hour '{}': {}", raw, e))
}

fn parse_range(start: &str, end: &str) -> Result<HourRange, String> {
    Ok(HourRange::new(parse_hour(start)?, parse_hour(end)?))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize output: {}", e))?;
    println!("{}", json);
    Ok(())
}

fn run(service: &ReservationService<CsvReservationStore>, args: &[String]) -> Result<(), String> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        ["occupancy", resource, date] => {
            let date = parse_date(date)?;
            let occupancy = service
                .occupancy_for_resource(&ResourceRef::from(*resource), date)
                .map_err(|e| e.to_string())?;
            print_json(&occupancy)
        }
        ["owner", owner, date] => {
            let date = parse_date(date)?;
            let occupancy = service
                .occupancy_for_owner(&UserRef::from(*owner), date)
                .map_err(|e| e.to_string())?;
            print_json(&occupancy)
        }
        ["select", resource, date, taps @ ..] if !taps.is_empty() => {
            let date = parse_date(date)?;
            let mut selector = service
                .selector_for(&ResourceRef::from(*resource), date)
                .map_err(|e| e.to_string())?;
            println!("occupancy {}", selector.occupancy());

            for tap in taps {
                let hour = parse_hour(tap)?;
                match selector.tap(hour) {
                    Ok(SelectionEmission::Selected { start, end }) => {
                        println!("tap {:>2} -> selected {}..={}", hour, start, end)
                    }
                    Ok(SelectionEmission::Cleared) => println!("tap {:>2} -> cleared", hour),
                    Err(e) => println!("tap {:>2} -> refused: {}", hour, e),
                }
            }

            match selector.candidate() {
                Some(candidate) => {
                    match validate(service.policy(), selector.occupancy(), candidate) {
                        Ok(range) => println!("candidate {} is bookable", range.label(date)),
                        Err(reason) => println!("candidate {} rejected: {}", candidate, reason),
                    }
                }
                None => println!("no complete selection"),
            }
            Ok(())
        }
        ["book", resource, owner, date, start, end] => {
            let date = parse_date(date)?;
            let range = parse_range(start, end)?;
            let reservation = service
                .create(
                    &ResourceRef::from(*resource),
                    &UserRef::from(*owner),
                    date,
                    range,
                )
                .map_err(|e| e.to_string())?;
            print_json(&reservation)
        }
        ["move", id, date, start, end] => {
            let date = parse_date(date)?;
            let range = parse_range(start, end)?;
            let reservation = service
                .update(id, date, range)
                .map_err(|e| e.to_string())?;
            print_json(&reservation)
        }
        ["cancel", id] => {
            let reservation = service.delete(id).map_err(|e| e.to_string())?;
            print_json(&reservation)
        }
        _ => Err(USAGE.to_string()),
    }
}

fn main() {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            process::exit(2);
        }
    };

    let store = match open_reservation_store(&config.database_path) {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to open reservation store: {}", e);
            process::exit(2);
        }
    };
    info!("Reservation store opened at {}", store.path());

    let service = ReservationService::new(store, config.policy);

    let args: Vec<String> = env::args().skip(1).collect();
    if let Err(e) = run(&service, &args) {
        eprintln!("{}", e);
        process::exit(1);
    }
}
