//! Persistence boundary of the scheduler.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use eyre::Result;
use uuid::Uuid;

use crate::filters::{AppointmentFilter, ShiftFilter};
use crate::models::appointment::{Appointment, AppointmentStatus};
use crate::models::force_override::ForceOverride;
use crate::models::resource::{Resource, SlotType};
use crate::models::shift::ShiftDefinition;

/// What a new or moved appointment occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    Slot { date: NaiveDate, time: NaiveTime },
    Period { start: NaiveDate, end: NaiveDate },
}

impl Claim {
    pub fn of(appointment: &Appointment) -> Self {
        match appointment.time {
            Some(time) => Claim::Slot {
                date: appointment.date,
                time,
            },
            None => Claim::Period {
                start: appointment.date,
                end: appointment.last_day(),
            },
        }
    }

    /// Booking mode the claim belongs to.
    pub fn slot_type(&self) -> SlotType {
        match self {
            Claim::Slot { .. } => SlotType::Minutes,
            Claim::Period { .. } => SlotType::Days,
        }
    }

    /// Whether an existing active row collides with this claim.
    pub fn conflicts_with(&self, existing: &Appointment) -> bool {
        match *self {
            Claim::Slot { date, time } => existing.date == date && existing.time == Some(time),
            Claim::Period { start, end } => existing.overlaps(start, end),
        }
    }
}

/// Result of a write that re-verifies availability before committing.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    Committed(Appointment),
    /// Another active row took the slot or overlapping days first, or the
    /// modality switched booking mode; nothing was written.
    Conflict,
    /// The row being moved or retired changed status or was removed since it
    /// was read; nothing was written.
    Stale,
}

/// Status and bookkeeping columns written by cancel and advance.
///
/// Date, time and period columns are never touched.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub id: Uuid,
    /// Applied only while the stored row is still in this status.
    pub expected: AppointmentStatus,
    pub status: AppointmentStatus,
    /// Replaces the stored reason when set.
    pub reason: Option<String>,
    pub canceled_by: Option<Uuid>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl StatusChange {
    /// Apply the change to an in-memory copy of the row.
    pub fn apply(&self, appointment: &mut Appointment) {
        appointment.status = self.status;
        if self.reason.is_some() {
            appointment.reason = self.reason.clone();
        }
        if self.canceled_by.is_some() {
            appointment.canceled_by = self.canceled_by;
            appointment.canceled_at = self.canceled_at;
        }
        if self.updated_by.is_some() {
            appointment.updated_by = self.updated_by;
        }
        appointment.updated_at = self.updated_at;
    }
}

/// Result of switching a modality between minutes and days mode.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotTypeChange {
    Changed(Resource),
    /// Live appointments exist; nothing was written.
    Locked,
    Missing,
}

#[async_trait]
pub trait SchedulingStore: Send + Sync {
    async fn get_resource(&self, id: Uuid) -> Result<Option<Resource>>;

    /// Atomically check that the modality has no live appointment and switch
    /// its booking mode.
    async fn change_slot_type(&self, id: Uuid, slot_type: SlotType) -> Result<SlotTypeChange>;

    async fn list_shift_definitions(&self, filter: &ShiftFilter) -> Result<Vec<ShiftDefinition>>;

    async fn get_force_override(
        &self,
        resource_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ForceOverride>>;

    async fn find_appointments(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>>;

    /// Soft-deleted rows are returned too; callers decide what to do with them.
    async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>>;

    /// Atomically re-check that no active row conflicts with the new
    /// appointment, optionally soft-delete `retire`, then insert.
    ///
    /// `retire` must still be a live canceled row, otherwise the outcome is
    /// [`CommitOutcome::Stale`].
    async fn insert_appointment(
        &self,
        appointment: Appointment,
        retire: Option<Uuid>,
    ) -> Result<CommitOutcome>;

    /// Atomically re-check conflicts (ignoring the appointment itself) and
    /// write its date, time, period and `updated_*` columns, provided the
    /// stored row is live and still in a reschedulable status.
    async fn reschedule_appointment(&self, appointment: Appointment) -> Result<CommitOutcome>;

    /// Compare-and-set on the status column. `None` when the row is gone or
    /// no longer in `change.expected`.
    async fn update_status(&self, change: &StatusChange) -> Result<Option<Appointment>>;

    /// Soft-delete a live row. `None` when it is missing or already deleted.
    async fn remove_appointment(
        &self,
        id: Uuid,
        removed_by: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<Appointment>>;
}
