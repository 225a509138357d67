//! Booking operations on top of a [`SchedulingStore`].
//!
//! Each write runs the read-side pipeline first (shifts, candidates,
//! availability, rules) and then hands the new row to the store, which
//! re-checks conflicts and inserts in one atomic step.

use chrono::{Days, NaiveDate, NaiveTime};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::SchedulingConfig;
use crate::errors::{ScheduleError, ScheduleResult};
use crate::filters::{AppointmentFilter, ShiftFilter};
use crate::models::appointment::{
    Actor, Appointment, AppointmentStatus, BookAppointmentRequest, UpdateAppointmentRequest,
};
use crate::models::availability::{
    BookedSlots, CheckAvailabilityQuery, NextAvailability, WorkingSlots,
};
use crate::models::resource::{Resource, SlotType};
use crate::models::shift::ShiftDefinition;
use crate::scheduling::finder::{self, SearchContext, SearchRequest};
use crate::scheduling::{availability, rules, shifts, slots};
use crate::store::{CommitOutcome, SchedulingStore, SlotTypeChange, StatusChange};

/// Compare-and-set attempts for cancel and advance before giving up.
const STATUS_WRITE_ATTEMPTS: usize = 3;

/// Where a booking lands once every check has passed.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Placement {
    date: NaiveDate,
    time: Option<NaiveTime>,
    end_date: Option<NaiveDate>,
    duration_days: Option<u32>,
}

/// Target status of a cancel, or `None` when already canceled.
fn cancel_target(status: AppointmentStatus) -> ScheduleResult<Option<AppointmentStatus>> {
    match status {
        AppointmentStatus::Canceled => Ok(None),
        AppointmentStatus::Done => Err(ScheduleError::InvalidStatusTransition {
            from: status,
            to: AppointmentStatus::Canceled,
        }),
        AppointmentStatus::Scheduled
        | AppointmentStatus::Confirmed
        | AppointmentStatus::Pending
        | AppointmentStatus::InProgress => Ok(Some(AppointmentStatus::Canceled)),
    }
}

/// Target status of an advance, or `None` when already done.
fn advance_target(status: AppointmentStatus) -> ScheduleResult<Option<AppointmentStatus>> {
    match status {
        AppointmentStatus::Done => Ok(None),
        AppointmentStatus::Canceled => Err(ScheduleError::InvalidStatusTransition {
            from: status,
            to: AppointmentStatus::Done,
        }),
        AppointmentStatus::Scheduled
        | AppointmentStatus::Confirmed
        | AppointmentStatus::Pending
        | AppointmentStatus::InProgress => Ok(Some(AppointmentStatus::Done)),
    }
}

fn not_reschedulable(status: AppointmentStatus) -> ScheduleError {
    ScheduleError::Validation {
        field: "status",
        reason: format!("{status} appointments cannot be rescheduled"),
    }
}

fn status_contended(id: Uuid) -> ScheduleError {
    ScheduleError::Validation {
        field: "status",
        reason: format!("appointment {id} kept changing status; retry"),
    }
}

fn is_reschedulable(status: AppointmentStatus) -> bool {
    match status {
        AppointmentStatus::Scheduled | AppointmentStatus::Confirmed | AppointmentStatus::Pending => {
            true
        }
        AppointmentStatus::InProgress | AppointmentStatus::Done | AppointmentStatus::Canceled => {
            false
        }
    }
}

pub struct Scheduler {
    store: Arc<dyn SchedulingStore>,
    clock: Arc<dyn Clock>,
    config: SchedulingConfig,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn SchedulingStore>,
        clock: Arc<dyn Clock>,
        config: SchedulingConfig,
    ) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &SchedulingConfig {
        &self.config
    }

    async fn active_resource(&self, id: Uuid) -> ScheduleResult<Resource> {
        match self.store.get_resource(id).await? {
            Some(resource) if resource.is_active => Ok(resource),
            _ => Err(ScheduleError::ResourceNotFound(id)),
        }
    }

    async fn live_appointment(&self, id: Uuid) -> ScheduleResult<Appointment> {
        match self.store.get_appointment(id).await? {
            Some(appointment) if appointment.deleted_at.is_none() => Ok(appointment),
            _ => Err(ScheduleError::AppointmentNotFound(id)),
        }
    }

    async fn shifts_for(
        &self,
        resource: &Resource,
        date: NaiveDate,
    ) -> ScheduleResult<Vec<ShiftDefinition>> {
        let definitions = self
            .store
            .list_shift_definitions(&ShiftFilter::for_date(resource.id, date))
            .await?;
        Ok(shifts::resolve(resource, date, &definitions))
    }

    /// Candidate slots for a date, ignoring what is already booked.
    pub async fn get_working_slots(
        &self,
        resource_id: Uuid,
        date: NaiveDate,
    ) -> ScheduleResult<WorkingSlots> {
        let resource = self.active_resource(resource_id).await?;
        let day_shifts = self.shifts_for(&resource, date).await?;
        let candidates = slots::generate(&resource, date, &day_shifts, self.clock.now(), &self.config);
        debug!(
            "Working slots for modality {} on {}: {:?}",
            resource_id, date, candidates
        );
        Ok(candidates)
    }

    /// Slots of a date that can still be booked.
    pub async fn get_free_slots(
        &self,
        resource_id: Uuid,
        date: NaiveDate,
    ) -> ScheduleResult<WorkingSlots> {
        let candidates = self.get_working_slots(resource_id, date).await?;
        let booked = self
            .store
            .find_appointments(&AppointmentFilter::active(resource_id, date, date))
            .await?;
        Ok(availability::available_slots(candidates, date, &booked))
    }

    pub async fn get_booked_slots(
        &self,
        resource_id: Uuid,
        date: NaiveDate,
    ) -> ScheduleResult<BookedSlots> {
        let resource = self.active_resource(resource_id).await?;
        let booked = self
            .store
            .find_appointments(&AppointmentFilter::active(resource_id, date, date))
            .await?;
        Ok(availability::booked_slots(resource.slot_type, date, &booked))
    }

    /// Search forward for the next opening.
    pub async fn check_availability(
        &self,
        resource_id: Uuid,
        query: &CheckAvailabilityQuery,
    ) -> ScheduleResult<Option<NextAvailability>> {
        let resource = self.active_resource(resource_id).await?;
        let now = self.clock.now();

        if let Some(days) = query.duration_days {
            if resource.slot_type == SlotType::Days && (days == 0 || days > resource.max_days()) {
                return Err(ScheduleError::DurationNotAllowed {
                    duration_days: Some(days),
                    reason: format!(
                        "duration_days must be between 1 and {}",
                        resource.max_days()
                    ),
                });
            }
        }

        let from = match (query.date, query.days_from_now) {
            (Some(date), _) => date,
            (None, Some(days)) => now
                .date()
                .checked_add_days(Days::new(u64::from(days)))
                .ok_or_else(|| ScheduleError::Validation {
                    field: "days_from_now",
                    reason: format!("{days} days from today is past the last representable date"),
                })?,
            (None, None) => now.date(),
        };
        let request = SearchRequest {
            from,
            range_limit: query.range_limit,
            duration_days: query.duration_days,
            excluded_dates: query.excluded_dates.clone(),
        };

        let definitions = self
            .store
            .list_shift_definitions(&ShiftFilter::all_for(resource_id))
            .await?;
        let appointments = self
            .store
            .find_appointments(&AppointmentFilter::active(
                resource_id,
                request.first_day(now.date()),
                request.window_end(now.date(), &self.config),
            ))
            .await?;

        let ctx = SearchContext {
            resource: &resource,
            definitions: &definitions,
            appointments: &appointments,
            now,
            config: &self.config,
        };
        let next = finder::find_next(&ctx, &request);
        debug!(
            "Next availability for modality {} from {}: {:?}",
            resource_id, from, next
        );
        Ok(next)
    }

    /// Run every pre-write check and work out what the booking occupies.
    #[allow(clippy::too_many_arguments)]
    async fn place(
        &self,
        resource: &Resource,
        date: NaiveDate,
        time: Option<NaiveTime>,
        duration_days: Option<u32>,
        force: bool,
        actor: &Actor,
        exclude: Option<Uuid>,
    ) -> ScheduleResult<Placement> {
        let grant = if force {
            let grant = self
                .store
                .get_force_override(resource.id, actor.user_id)
                .await?;
            rules::authorize_force(actor, grant.as_ref())?;
            Some(grant)
        } else {
            None
        };
        let now = self.clock.now();

        match resource.slot_type {
            SlotType::Minutes => {
                let time = time.ok_or(ScheduleError::Validation {
                    field: "time",
                    reason: "a start time is required for this modality".to_string(),
                })?;
                rules::ensure_not_past(date, Some(time), now)?;

                let mut day_shifts = self.shifts_for(resource, date).await?;
                if let Some(grant) = &grant {
                    if day_shifts.is_empty() {
                        debug!("No shifts on {} for modality {}, using force window", date, resource.id);
                        day_shifts.push(rules::force_window(resource.id, grant.as_ref(), &self.config));
                    }
                }
                let candidates = slots::generate(resource, date, &day_shifts, now, &self.config);
                if !candidates.times().contains(&time) {
                    return Err(ScheduleError::SlotUnavailable {
                        date,
                        time: Some(time),
                        reason: "not a bookable slot for this modality".to_string(),
                    });
                }

                let booked = self
                    .store
                    .find_appointments(
                        &AppointmentFilter::active(resource.id, date, date).excluding(exclude),
                    )
                    .await?;
                let free = availability::available_slots(candidates, date, &booked);
                if !free.times().contains(&time) {
                    return Err(ScheduleError::SlotUnavailable {
                        date,
                        time: Some(time),
                        reason: "slot is already booked".to_string(),
                    });
                }

                Ok(Placement {
                    date,
                    time: Some(time),
                    end_date: None,
                    duration_days: None,
                })
            }
            SlotType::Days => {
                if time.is_some() {
                    debug!("Ignoring start time for full-day modality {}", resource.id);
                }
                let duration =
                    rules::validate_period(resource, date, duration_days, now.date(), &self.config)?;
                let end = rules::period_end(date, duration)?;

                let booked = self
                    .store
                    .find_appointments(
                        &AppointmentFilter::active(resource.id, date, end).excluding(exclude),
                    )
                    .await?;
                if !availability::period_is_free(&booked, date, end) {
                    return Err(ScheduleError::SlotUnavailable {
                        date,
                        time: None,
                        reason: format!("{date} to {end} overlaps an existing booking"),
                    });
                }

                Ok(Placement {
                    date,
                    time: None,
                    end_date: Some(end),
                    duration_days: Some(duration),
                })
            }
        }
    }

    fn new_appointment(
        &self,
        resource: &Resource,
        patient_id: Uuid,
        placement: Placement,
        reason: Option<String>,
        actor: &Actor,
    ) -> Appointment {
        let now = self.clock.now_utc();
        Appointment {
            id: Uuid::new_v4(),
            resource_id: resource.id,
            patient_id,
            date: placement.date,
            time: placement.time,
            end_date: placement.end_date,
            duration_days: placement.duration_days,
            status: AppointmentStatus::Scheduled,
            reason,
            created_by: Some(actor.user_id),
            updated_by: None,
            canceled_by: None,
            canceled_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn committed(
        &self,
        outcome: CommitOutcome,
        placement: Placement,
        stale: impl FnOnce() -> ScheduleError,
    ) -> ScheduleResult<Appointment> {
        match outcome {
            CommitOutcome::Committed(appointment) => Ok(appointment),
            CommitOutcome::Conflict => {
                warn!(
                    "Booking on {} {:?} lost a race with a concurrent booking",
                    placement.date, placement.time
                );
                Err(ScheduleError::SlotUnavailable {
                    date: placement.date,
                    time: placement.time,
                    reason: "slot is no longer available".to_string(),
                })
            }
            CommitOutcome::Stale => Err(stale()),
        }
    }

    pub async fn book(
        &self,
        request: BookAppointmentRequest,
        actor: Actor,
    ) -> ScheduleResult<Appointment> {
        if request.rebook_canceled {
            return self
                .rebook_canceled(request.modality_id, request.date, request.patient_id, actor)
                .await;
        }

        let resource = self.active_resource(request.modality_id).await?;

        let previous = match request.follow_up_of {
            Some(id) => {
                let previous = self.live_appointment(id).await?;
                advance_target(previous.status)?;
                Some(previous)
            }
            None => None,
        };

        let placement = self
            .place(
                &resource,
                request.date,
                request.time,
                request.duration_days,
                request.force,
                &actor,
                None,
            )
            .await?;
        let appointment =
            self.new_appointment(&resource, request.patient_id, placement, request.reason, &actor);

        let outcome = self.store.insert_appointment(appointment, None).await?;
        let created = self.committed(outcome, placement, || {
            ScheduleError::Database(eyre::eyre!("insert without a retired row reported stale"))
        })?;
        info!(
            "Booked appointment {} on modality {} for {} {:?}",
            created.id, resource.id, created.date, created.time
        );

        if let Some(previous) = previous {
            if let Err(err) = self.advance(previous.id, Some(actor)).await {
                warn!(
                    "Booked {} but could not mark follow-up source {} done: {}",
                    created.id, previous.id, err
                );
            }
        }

        Ok(created)
    }

    /// Turn a canceled booking starting on `date` back into a live one.
    ///
    /// The most recently canceled row is reused: its time or period length
    /// carries over, and the row itself is soft-deleted in the same write
    /// that inserts the new booking.
    pub async fn rebook_canceled(
        &self,
        resource_id: Uuid,
        date: NaiveDate,
        patient_id: Uuid,
        actor: Actor,
    ) -> ScheduleResult<Appointment> {
        let resource = self.active_resource(resource_id).await?;
        let canceled = self
            .store
            .find_appointments(&AppointmentFilter::canceled_on(resource_id, date))
            .await?
            .into_iter()
            .max_by_key(|a| (a.canceled_at, a.updated_at))
            .ok_or(ScheduleError::NoCanceledAppointmentFound { date })?;

        let placement = self
            .place(
                &resource,
                canceled.date,
                canceled.time,
                canceled.duration_days,
                false,
                &actor,
                None,
            )
            .await?;
        let appointment =
            self.new_appointment(&resource, patient_id, placement, canceled.reason.clone(), &actor);

        let outcome = self
            .store
            .insert_appointment(appointment, Some(canceled.id))
            .await?;
        let created = self.committed(outcome, placement, || {
            ScheduleError::NoCanceledAppointmentFound { date }
        })?;
        info!(
            "Rebooked canceled appointment {} as {} on modality {}",
            canceled.id, created.id, resource_id
        );
        Ok(created)
    }

    /// Move an appointment, re-validating everything except its own slot.
    pub async fn update(
        &self,
        appointment_id: Uuid,
        request: UpdateAppointmentRequest,
        actor: Actor,
    ) -> ScheduleResult<Appointment> {
        let current = self.live_appointment(appointment_id).await?;
        if !is_reschedulable(current.status) {
            return Err(not_reschedulable(current.status));
        }
        let current_status = current.status;
        let resource = self.active_resource(current.resource_id).await?;

        let placement = self
            .place(
                &resource,
                request.date,
                request.time,
                request.duration_days,
                request.force,
                &actor,
                Some(appointment_id),
            )
            .await?;
        let moved = Appointment {
            date: placement.date,
            time: placement.time,
            end_date: placement.end_date,
            duration_days: placement.duration_days,
            updated_by: Some(actor.user_id),
            updated_at: self.clock.now_utc(),
            ..current
        };

        let outcome = self.store.reschedule_appointment(moved).await?;
        if outcome == CommitOutcome::Stale {
            let latest = self.live_appointment(appointment_id).await?;
            warn!(
                "Appointment {} became {} while being rescheduled",
                appointment_id, latest.status
            );
            return Err(not_reschedulable(latest.status));
        }
        let updated = self.committed(outcome, placement, || not_reschedulable(current_status))?;
        info!(
            "Rescheduled appointment {} to {} {:?}",
            updated.id, updated.date, updated.time
        );
        Ok(updated)
    }

    /// Cancel an appointment. Canceling twice returns the stored state.
    pub async fn cancel(
        &self,
        appointment_id: Uuid,
        reason: Option<String>,
        actor: Actor,
    ) -> ScheduleResult<Appointment> {
        for _ in 0..STATUS_WRITE_ATTEMPTS {
            let current = self.live_appointment(appointment_id).await?;
            let Some(status) = cancel_target(current.status)? else {
                debug!("Appointment {} is already canceled", appointment_id);
                return Ok(current);
            };

            let now = self.clock.now_utc();
            let change = StatusChange {
                id: appointment_id,
                expected: current.status,
                status,
                reason: reason.clone(),
                canceled_by: Some(actor.user_id),
                canceled_at: Some(now),
                updated_by: Some(actor.user_id),
                updated_at: now,
            };
            if let Some(canceled) = self.store.update_status(&change).await? {
                info!("Canceled appointment {}", appointment_id);
                return Ok(canceled);
            }
            debug!("Appointment {} changed under cancel, re-reading", appointment_id);
        }
        Err(status_contended(appointment_id))
    }

    /// Mark an appointment done.
    pub async fn advance(
        &self,
        appointment_id: Uuid,
        actor: Option<Actor>,
    ) -> ScheduleResult<Appointment> {
        for _ in 0..STATUS_WRITE_ATTEMPTS {
            let current = self.live_appointment(appointment_id).await?;
            let Some(status) = advance_target(current.status)? else {
                return Ok(current);
            };

            let change = StatusChange {
                id: appointment_id,
                expected: current.status,
                status,
                reason: None,
                canceled_by: None,
                canceled_at: None,
                updated_by: actor.map(|a| a.user_id),
                updated_at: self.clock.now_utc(),
            };
            if let Some(done) = self.store.update_status(&change).await? {
                info!("Appointment {} marked done", appointment_id);
                return Ok(done);
            }
            debug!("Appointment {} changed under advance, re-reading", appointment_id);
        }
        Err(status_contended(appointment_id))
    }

    /// Soft-delete an appointment. It disappears from every query.
    pub async fn remove(&self, appointment_id: Uuid, actor: Actor) -> ScheduleResult<Appointment> {
        let removed = self
            .store
            .remove_appointment(appointment_id, actor.user_id, self.clock.now_utc())
            .await?
            .ok_or(ScheduleError::AppointmentNotFound(appointment_id))?;
        info!("Removed appointment {}", appointment_id);
        Ok(removed)
    }

    pub async fn get_force_ability(&self, resource_id: Uuid, user_id: Uuid) -> ScheduleResult<bool> {
        self.active_resource(resource_id).await?;
        let grant = self.store.get_force_override(resource_id, user_id).await?;
        Ok(grant.is_some_and(|g| g.is_able_to_force))
    }

    /// Switch a modality between minutes and days mode while it has no
    /// appointments.
    pub async fn change_slot_type(
        &self,
        resource_id: Uuid,
        slot_type: SlotType,
    ) -> ScheduleResult<Resource> {
        match self.store.change_slot_type(resource_id, slot_type).await? {
            SlotTypeChange::Changed(resource) => {
                info!("Modality {} now books in {:?} mode", resource_id, resource.slot_type);
                Ok(resource)
            }
            SlotTypeChange::Locked => {
                warn!(
                    "Refusing slot type change on modality {} with live appointments",
                    resource_id
                );
                Err(ScheduleError::SlotTypeLocked(resource_id))
            }
            SlotTypeChange::Missing => Err(ScheduleError::ResourceNotFound(resource_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::appointment::RESCHEDULABLE_STATUSES;

    #[test]
    fn status_transitions_are_closed() {
        use AppointmentStatus::*;
        for status in [Scheduled, Confirmed, Pending, InProgress] {
            assert_eq!(cancel_target(status).ok(), Some(Some(Canceled)));
            assert_eq!(advance_target(status).ok(), Some(Some(Done)));
        }
        assert_eq!(cancel_target(Canceled).ok(), Some(None));
        assert_eq!(advance_target(Done).ok(), Some(None));
        assert!(cancel_target(Done).is_err());
        assert!(advance_target(Canceled).is_err());
        assert!(!is_reschedulable(InProgress));
        assert!(is_reschedulable(Pending));
        for status in [Scheduled, Confirmed, Canceled, Pending, Done, InProgress] {
            assert_eq!(
                is_reschedulable(status),
                RESCHEDULABLE_STATUSES.contains(&status),
                "{status}"
            );
        }
    }
}
