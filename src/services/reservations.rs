use chrono::NaiveDate;
use tracing::{info, warn};

use crate::error::{ReservationError, StoreError, ValidationError};
use crate::models::reservation::{
    HourRange, NewReservation, ReservationInterval, ResourceRef, UserRef,
};
use crate::models::window::SchedulingPolicy;
use crate::services::database::ReservationStore;
use crate::services::occupancy::{build_day_occupancy, OccupancyBitmap};
use crate::services::range_selector::RangeSelector;
use crate::services::validator::validate;

/// Create, edit and cancel reservations against a persistence collaborator.
///
/// Validation runs on an occupancy snapshot; the store has the final word on
/// conflicts and its refusal surfaces as
/// [`ReservationError::ConcurrentConflict`].
pub struct ReservationService<S> {
    store: S,
    policy: SchedulingPolicy,
}

impl<S: ReservationStore> ReservationService<S> {
    pub fn new(store: S, policy: SchedulingPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &SchedulingPolicy {
        &self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn occupancy_for_resource(
        &self,
        resource_id: &ResourceRef,
        date: NaiveDate,
    ) -> Result<OccupancyBitmap, ReservationError> {
        let reservations = self.store.list_for_resource(resource_id)?;
        Ok(build_day_occupancy(&self.policy, date, &reservations, None))
    }

    /// Hours on `date` in which the owner already holds a reservation, on any resource
    pub fn occupancy_for_owner(
        &self,
        owner_id: &UserRef,
        date: NaiveDate,
    ) -> Result<OccupancyBitmap, ReservationError> {
        let reservations = self.store.list_for_owner(owner_id)?;
        Ok(build_day_occupancy(&self.policy, date, &reservations, None))
    }

    /// Start an interactive selection over the resource's current occupancy
    pub fn selector_for(
        &self,
        resource_id: &ResourceRef,
        date: NaiveDate,
    ) -> Result<RangeSelector, ReservationError> {
        let occupancy = self.occupancy_for_resource(resource_id, date)?;
        Ok(RangeSelector::new(occupancy, &self.policy))
    }

    pub fn create(
        &self,
        resource_id: &ResourceRef,
        owner_id: &UserRef,
        date: NaiveDate,
        range: HourRange,
    ) -> Result<ReservationInterval, ReservationError> {
        info!(
            "Received request to reserve {} for {} at {}",
            resource_id,
            owner_id,
            range.label(date)
        );

        let occupancy = self.occupancy_for_resource(resource_id, date)?;
        let range = self.check(&occupancy, range, date)?;

        let reservation = self
            .store
            .insert(NewReservation {
                resource_id: resource_id.clone(),
                owner_id: owner_id.clone(),
                start_time: self.policy.instant_at(date, range.start),
                end_time: self.policy.instant_at(date, range.end),
            })
            .map_err(|e| self.commit_failed(e, date, range))?;

        info!(
            "Successfully reserved {} as {} at {}",
            resource_id,
            reservation.id,
            range.label(date)
        );
        Ok(reservation)
    }

    /// Book the candidate of a complete selection
    pub fn book_selection(
        &self,
        resource_id: &ResourceRef,
        owner_id: &UserRef,
        date: NaiveDate,
        selector: &RangeSelector,
    ) -> Result<ReservationInterval, ReservationError> {
        let range = selector
            .candidate()
            .ok_or(ReservationError::Rejected(ValidationError::InvalidRange))?;
        self.create(resource_id, owner_id, date, range)
    }

    /// Replace the start and end of an existing reservation
    pub fn update(
        &self,
        id: &str,
        date: NaiveDate,
        range: HourRange,
    ) -> Result<ReservationInterval, ReservationError> {
        info!(
            "Received request to move reservation {} to {}",
            id,
            range.label(date)
        );

        let existing = self
            .store
            .find(id)?
            .ok_or_else(|| ReservationError::NotFound(id.to_string()))?;

        let reservations = self.store.list_for_resource(&existing.resource_id)?;
        let occupancy = build_day_occupancy(&self.policy, date, &reservations, Some(id));
        let range = self.check(&occupancy, range, date)?;

        let reservation = self
            .store
            .update(
                id,
                self.policy.instant_at(date, range.start),
                self.policy.instant_at(date, range.end),
            )
            .map_err(|e| self.commit_failed(e, date, range))?;

        info!("Successfully moved reservation {} to {}", id, range.label(date));
        Ok(reservation)
    }

    pub fn delete(&self, id: &str) -> Result<ReservationInterval, ReservationError> {
        info!("Received request to cancel reservation {}", id);

        let removed = self.store.delete(id)?;

        info!(
            "Successfully cancelled reservation {} of {}",
            id, removed.resource_id
        );
        Ok(removed)
    }

    fn check(
        &self,
        occupancy: &OccupancyBitmap,
        range: HourRange,
        date: NaiveDate,
    ) -> Result<HourRange, ReservationError> {
        validate(&self.policy, occupancy, range).map_err(|reason| {
            warn!("Rejected {}: {}", range.label(date), reason);
            ReservationError::Rejected(reason)
        })
    }

    fn commit_failed(
        &self,
        err: StoreError,
        date: NaiveDate,
        range: HourRange,
    ) -> ReservationError {
        let err = ReservationError::from(err);
        if let ReservationError::ConcurrentConflict(existing_id) = &err {
            warn!(
                "Selection {} went stale: reservation {} was committed first",
                range.label(date),
                existing_id
            );
        }
        err
    }
}
