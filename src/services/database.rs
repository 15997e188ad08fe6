use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, WriterBuilder};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{error, info, warn};

use crate::error::StoreError;
use crate::models::reservation::{NewReservation, ReservationInterval, ResourceRef, UserRef};

const HEADERS: [&str; 6] = [
    "id",
    "resource_id",
    "owner_id",
    "start_time",
    "end_time",
    "created_at",
];

/// Persistence collaborator for reservations.
///
/// Implementations are the sole authority on durable conflicts: `insert` and
/// `update` must fail with [`StoreError::Conflict`] when the interval
/// overlaps a committed reservation of the same resource.
pub trait ReservationStore {
    fn list_for_resource(
        &self,
        resource_id: &ResourceRef,
    ) -> Result<Vec<ReservationInterval>, StoreError>;

    fn list_for_owner(&self, owner_id: &UserRef) -> Result<Vec<ReservationInterval>, StoreError>;

    fn find(&self, id: &str) -> Result<Option<ReservationInterval>, StoreError>;

    fn insert(&self, reservation: NewReservation) -> Result<ReservationInterval, StoreError>;

    fn update(
        &self,
        id: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<ReservationInterval, StoreError>;

    fn delete(&self, id: &str) -> Result<ReservationInterval, StoreError>;
}

// Row stored in the CSV file
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReservationRecord {
    pub id: String,
    pub resource_id: String,
    pub owner_id: String,
    pub start_time: String, // RFC 3339
    pub end_time: String,   // RFC 3339
    pub created_at: String, // RFC 3339
}

impl ReservationRecord {
    fn to_interval(&self) -> Result<ReservationInterval, StoreError> {
        let parse = |value: &str, field: &str| {
            DateTime::parse_from_rfc3339(value)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    StoreError::Corrupt(format!(
                        "reservation {} has invalid {} '{}': {}",
                        self.id, field, value, e
                    ))
                })
        };

        Ok(ReservationInterval {
            id: self.id.clone(),
            resource_id: ResourceRef(self.resource_id.clone()),
            owner_id: UserRef(self.owner_id.clone()),
            start_time: parse(&self.start_time, "start_time")?,
            end_time: parse(&self.end_time, "end_time")?,
        })
    }
}

/// CSV-backed reservation store.
///
/// Every read-check-write sequence runs under one mutex, so the overlap check
/// and the write that follows it cannot interleave with another writer in
/// this process.
pub struct CsvReservationStore {
    csv_path: String,
    file_mutex: Mutex<()>,
}

impl CsvReservationStore {
    pub fn new(csv_path: &str) -> Result<Self, StoreError> {
        let store = Self {
            csv_path: csv_path.to_string(),
            file_mutex: Mutex::new(()),
        };
        store.ensure_file()?;
        Ok(store)
    }

    pub fn path(&self) -> &str {
        &self.csv_path
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.file_mutex
            .lock()
            .map_err(|e| StoreError::Io(format!("Failed to acquire mutex: {}", e)))
    }

    // Create the CSV file with headers if it doesn't exist
    fn ensure_file(&self) -> Result<(), StoreError> {
        if Path::new(&self.csv_path).exists() {
            return Ok(());
        }
        info!("Creating new reservations database file at {}", self.csv_path);

        let file = File::create(&self.csv_path).map_err(|e| {
            error!("Failed to create database file: {}", e);
            StoreError::Io(format!("Failed to create database file: {}", e))
        })?;

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer
            .write_record(HEADERS)
            .map_err(|e| StoreError::Io(format!("Failed to write headers: {}", e)))?;
        writer
            .flush()
            .map_err(|e| StoreError::Io(format!("Failed to flush headers: {}", e)))
    }

    // Caller must hold the mutex
    fn load_records(&self) -> Result<Vec<ReservationRecord>, StoreError> {
        let file = match File::open(&self.csv_path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Database file {} is missing, treating as empty", self.csv_path);
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(StoreError::Io(format!(
                    "Failed to open database file: {}",
                    e
                )))
            }
        };

        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
        reader
            .deserialize::<ReservationRecord>()
            .map(|result| {
                result.map_err(|e| StoreError::Corrupt(format!("Failed to read record: {}", e)))
            })
            .collect()
    }

    // Caller must hold the mutex
    fn load_intervals(&self) -> Result<Vec<ReservationInterval>, StoreError> {
        self.load_records()?
            .iter()
            .map(ReservationRecord::to_interval)
            .collect()
    }

    // Caller must hold the mutex
    fn append_record(&self, record: &ReservationRecord) -> Result<(), StoreError> {
        self.ensure_file()?;
        let file = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .map_err(|e| StoreError::Io(format!("Failed to open database file: {}", e)))?;

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer
            .serialize(record)
            .map_err(|e| StoreError::Io(format!("Failed to serialize record: {}", e)))?;
        writer
            .flush()
            .map_err(|e| StoreError::Io(format!("Failed to flush writer: {}", e)))
    }

    // Caller must hold the mutex
    fn rewrite_records(&self, records: &[ReservationRecord]) -> Result<(), StoreError> {
        let file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(&self.csv_path)
            .map_err(|e| {
                StoreError::Io(format!("Failed to open database file for writing: {}", e))
            })?;

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer
            .write_record(HEADERS)
            .map_err(|e| StoreError::Io(format!("Failed to write headers: {}", e)))?;
        for record in records {
            writer
                .serialize(record)
                .map_err(|e| StoreError::Io(format!("Failed to write record: {}", e)))?;
        }
        writer
            .flush()
            .map_err(|e| StoreError::Io(format!("Failed to flush writer: {}", e)))
    }
}

/// First reservation of `resource_id` overlapping `[start_time, end_time)`,
/// ignoring the reservation named `exclude_id`
fn find_overlap(
    intervals: &[ReservationInterval],
    resource_id: &ResourceRef,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    exclude_id: Option<&str>,
) -> Option<String> {
    intervals
        .iter()
        .filter(|i| &i.resource_id == resource_id)
        .filter(|i| exclude_id.map_or(true, |id| i.id != id))
        .find(|i| i.overlaps(start_time, end_time))
        .map(|i| i.id.clone())
}

/// Generate a reservation id not present in `records`
fn generate_reservation_id(records: &[ReservationRecord]) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let id = format!("rsv-{}", rng.gen_range(10000000..99999999));
        if !records.iter().any(|r| r.id == id) {
            return id;
        }
    }
}

impl ReservationStore for CsvReservationStore {
    fn list_for_resource(
        &self,
        resource_id: &ResourceRef,
    ) -> Result<Vec<ReservationInterval>, StoreError> {
        let _lock = self.lock()?;
        Ok(self
            .load_intervals()?
            .into_iter()
            .filter(|i| &i.resource_id == resource_id)
            .collect())
    }

    fn list_for_owner(&self, owner_id: &UserRef) -> Result<Vec<ReservationInterval>, StoreError> {
        let _lock = self.lock()?;
        Ok(self
            .load_intervals()?
            .into_iter()
            .filter(|i| &i.owner_id == owner_id)
            .collect())
    }

    fn find(&self, id: &str) -> Result<Option<ReservationInterval>, StoreError> {
        let _lock = self.lock()?;
        Ok(self.load_intervals()?.into_iter().find(|i| i.id == id))
    }

    fn insert(&self, reservation: NewReservation) -> Result<ReservationInterval, StoreError> {
        let _lock = self.lock()?;

        let records = self.load_records()?;
        let intervals = records
            .iter()
            .map(ReservationRecord::to_interval)
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(existing_id) = find_overlap(
            &intervals,
            &reservation.resource_id,
            reservation.start_time,
            reservation.end_time,
            None,
        ) {
            warn!(
                "Rejecting reservation of {} for {}-{}: overlaps {}",
                reservation.resource_id, reservation.start_time, reservation.end_time, existing_id
            );
            return Err(StoreError::Conflict { existing_id });
        }

        let record = ReservationRecord {
            id: generate_reservation_id(&records),
            resource_id: reservation.resource_id.0.clone(),
            owner_id: reservation.owner_id.0.clone(),
            start_time: reservation.start_time.to_rfc3339(),
            end_time: reservation.end_time.to_rfc3339(),
            created_at: Utc::now().to_rfc3339(),
        };
        self.append_record(&record)?;

        info!(
            "Stored reservation {} of {} for owner {}",
            record.id, record.resource_id, record.owner_id
        );

        Ok(ReservationInterval {
            id: record.id,
            resource_id: reservation.resource_id,
            owner_id: reservation.owner_id,
            start_time: reservation.start_time,
            end_time: reservation.end_time,
        })
    }

    fn update(
        &self,
        id: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<ReservationInterval, StoreError> {
        let _lock = self.lock()?;

        let mut records = self.load_records()?;
        let intervals = records
            .iter()
            .map(ReservationRecord::to_interval)
            .collect::<Result<Vec<_>, _>>()?;

        let idx = intervals
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let resource_id = intervals[idx].resource_id.clone();

        if let Some(existing_id) =
            find_overlap(&intervals, &resource_id, start_time, end_time, Some(id))
        {
            warn!(
                "Rejecting move of reservation {} to {}-{}: overlaps {}",
                id, start_time, end_time, existing_id
            );
            return Err(StoreError::Conflict { existing_id });
        }

        records[idx].start_time = start_time.to_rfc3339();
        records[idx].end_time = end_time.to_rfc3339();
        self.rewrite_records(&records)?;

        info!("Moved reservation {} to {}-{}", id, start_time, end_time);

        Ok(ReservationInterval {
            start_time,
            end_time,
            ..intervals[idx].clone()
        })
    }

    fn delete(&self, id: &str) -> Result<ReservationInterval, StoreError> {
        let _lock = self.lock()?;

        let mut records = self.load_records()?;
        let idx = records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let removed = records.remove(idx);
        self.rewrite_records(&records)?;

        info!("Cancelled reservation {} of {}", id, removed.resource_id);

        removed.to_interval()
    }
}

/// Open the reservation store, creating its parent directory when needed
pub fn open_reservation_store(csv_path: &str) -> Result<CsvReservationStore, StoreError> {
    if let Some(dir) = Path::new(csv_path).parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir).map_err(|e| {
                error!("Failed to create data directory: {}", e);
                StoreError::Io(format!("Failed to create data directory: {}", e))
            })?;
        }
    }

    CsvReservationStore::new(csv_path)
}
