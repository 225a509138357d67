//! Query predicates shared by every `SchedulingStore` implementation.
//!
//! The in-memory store evaluates [`ShiftFilter::matches`] and
//! [`AppointmentFilter::matches`] directly; the Postgres store translates the
//! same fields into `WHERE` clauses.

use chrono::{Datelike, NaiveDate};
use uuid::Uuid;

use crate::models::appointment::{Appointment, AppointmentStatus, INACTIVE_STATUSES};
use crate::models::shift::ShiftDefinition;

/// Shift definitions of a modality. With a date set, only the ones that may
/// apply on that day: recurring ones for its weekday plus date-specific ones
/// for the date itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShiftFilter {
    pub resource_id: Uuid,
    pub date: Option<NaiveDate>,
}

impl ShiftFilter {
    pub fn for_date(resource_id: Uuid, date: NaiveDate) -> Self {
        Self {
            resource_id,
            date: Some(date),
        }
    }

    pub fn all_for(resource_id: Uuid) -> Self {
        Self {
            resource_id,
            date: None,
        }
    }

    pub fn matches(&self, def: &ShiftDefinition) -> bool {
        if def.resource_id != self.resource_id || !def.is_active {
            return false;
        }
        let Some(day) = self.date else {
            return true;
        };
        match def.date {
            Some(date) => date == day,
            None => def.day_of_week == Some(day.weekday()),
        }
    }
}

/// Appointments of one modality intersecting a date range.
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentFilter {
    pub resource_id: Uuid,
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Statuses to leave out.
    pub excluded_statuses: &'static [AppointmentStatus],
    /// Only these statuses, when set.
    pub only_status: Option<AppointmentStatus>,
    /// Leave one appointment out, for update-in-place checks.
    pub exclude_id: Option<Uuid>,
    /// Match on the first day only instead of the whole range.
    pub starting_in_range: bool,
}

impl AppointmentFilter {
    /// Rows that occupy a slot or a day in `[from, to]`.
    pub fn active(resource_id: Uuid, from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            resource_id,
            from,
            to,
            excluded_statuses: INACTIVE_STATUSES,
            only_status: None,
            exclude_id: None,
            starting_in_range: false,
        }
    }

    /// Canceled rows starting on `date`, candidates for rebooking.
    pub fn canceled_on(resource_id: Uuid, date: NaiveDate) -> Self {
        Self {
            resource_id,
            from: date,
            to: date,
            excluded_statuses: &[],
            only_status: Some(AppointmentStatus::Canceled),
            exclude_id: None,
            starting_in_range: true,
        }
    }

    /// Every live row of a modality, whatever its status or date.
    pub fn any_for(resource_id: Uuid) -> Self {
        Self {
            resource_id,
            from: NaiveDate::MIN,
            to: NaiveDate::MAX,
            excluded_statuses: &[],
            only_status: None,
            exclude_id: None,
            starting_in_range: false,
        }
    }

    pub fn excluding(mut self, id: Option<Uuid>) -> Self {
        self.exclude_id = id;
        self
    }

    /// Soft-deleted rows never match.
    pub fn matches(&self, appointment: &Appointment) -> bool {
        if appointment.resource_id != self.resource_id || appointment.deleted_at.is_some() {
            return false;
        }
        if self.exclude_id == Some(appointment.id) {
            return false;
        }
        if self.excluded_statuses.contains(&appointment.status) {
            return false;
        }
        if let Some(status) = self.only_status {
            if appointment.status != status {
                return false;
            }
        }
        if self.starting_in_range {
            self.from <= appointment.date && appointment.date <= self.to
        } else {
            appointment.overlaps(self.from, self.to)
        }
    }
}
