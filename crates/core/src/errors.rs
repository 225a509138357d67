use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::models::appointment::AppointmentStatus;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Modality not found or inactive: {0}")]
    ResourceNotFound(uuid::Uuid),

    #[error("Appointment not found: {0}")]
    AppointmentNotFound(uuid::Uuid),

    #[error("Slot unavailable on {date}{}: {reason}", fmt_time(.time))]
    SlotUnavailable {
        date: NaiveDate,
        time: Option<NaiveTime>,
        reason: String,
    },

    #[error("Fridays are not bookable: {date}")]
    FridayNotBookable { date: NaiveDate },

    #[error("Duration not allowed: {reason}")]
    DurationNotAllowed {
        duration_days: Option<u32>,
        reason: String,
    },

    #[error("Requested date is in the past: {date}{}", fmt_time(.time))]
    PastDate {
        date: NaiveDate,
        time: Option<NaiveTime>,
    },

    #[error("No canceled appointment found on {date}")]
    NoCanceledAppointmentFound { date: NaiveDate },

    #[error("Force booking is not permitted for this user on this modality")]
    ForcePermissionDenied,

    #[error("Cannot move appointment from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Slot type cannot change once appointments exist for modality {0}")]
    SlotTypeLocked(uuid::Uuid),

    #[error("Validation error on {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),
}

fn fmt_time(time: &Option<NaiveTime>) -> String {
    match time {
        Some(t) => format!(" at {}", t.format("%H:%M")),
        None => String::new(),
    }
}

impl ScheduleError {
    /// Stable machine-readable code for callers rendering their own messages.
    pub fn code(&self) -> &'static str {
        match self {
            ScheduleError::ResourceNotFound(_) => "resource_not_found",
            ScheduleError::AppointmentNotFound(_) => "appointment_not_found",
            ScheduleError::SlotUnavailable { .. } => "slot_unavailable",
            ScheduleError::FridayNotBookable { .. } => "friday_not_bookable",
            ScheduleError::DurationNotAllowed { .. } => "duration_not_allowed",
            ScheduleError::PastDate { .. } => "past_date",
            ScheduleError::NoCanceledAppointmentFound { .. } => "no_canceled_appointment_found",
            ScheduleError::ForcePermissionDenied => "force_permission_denied",
            ScheduleError::InvalidStatusTransition { .. } => "invalid_status_transition",
            ScheduleError::SlotTypeLocked(_) => "slot_type_locked",
            ScheduleError::Validation { .. } => "validation_error",
            ScheduleError::Database(_) => "database_error",
        }
    }

    /// The request field the error refers to, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ScheduleError::ResourceNotFound(_) | ScheduleError::SlotTypeLocked(_) => {
                Some("modality_id")
            }
            ScheduleError::AppointmentNotFound(_) => Some("appointment_id"),
            ScheduleError::SlotUnavailable { time: Some(_), .. } => Some("time"),
            ScheduleError::SlotUnavailable { time: None, .. } => Some("date"),
            ScheduleError::FridayNotBookable { .. } => Some("date"),
            ScheduleError::DurationNotAllowed { .. } => Some("duration_days"),
            ScheduleError::PastDate { time: Some(_), .. } => Some("time"),
            ScheduleError::PastDate { time: None, .. } => Some("date"),
            ScheduleError::NoCanceledAppointmentFound { .. } => Some("date"),
            ScheduleError::ForcePermissionDenied => Some("force"),
            ScheduleError::InvalidStatusTransition { .. } => Some("status"),
            ScheduleError::Validation { field, .. } => Some(*field),
            ScheduleError::Database(_) => None,
        }
    }
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
