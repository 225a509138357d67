use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle state of an appointment. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Canceled,
    Pending,
    Done,
    InProgress,
}

/// Statuses that never occupy a slot or a day.
pub const INACTIVE_STATUSES: &[AppointmentStatus] = &[AppointmentStatus::Canceled];

/// Statuses from which an appointment may still be moved.
pub const RESCHEDULABLE_STATUSES: &[AppointmentStatus] = &[
    AppointmentStatus::Scheduled,
    AppointmentStatus::Confirmed,
    AppointmentStatus::Pending,
];

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Canceled => "canceled",
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Done => "done",
            AppointmentStatus::InProgress => "in_progress",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "canceled" => Ok(AppointmentStatus::Canceled),
            "pending" => Ok(AppointmentStatus::Pending),
            "done" => Ok(AppointmentStatus::Done),
            "in_progress" => Ok(AppointmentStatus::InProgress),
            other => Err(format!("unknown appointment status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub resource_id: Uuid,
    pub patient_id: Uuid,
    pub date: NaiveDate,
    /// `None` for full-day bookings.
    pub time: Option<NaiveTime>,
    /// Last day covered, inclusive. Days mode only.
    pub end_date: Option<NaiveDate>,
    pub duration_days: Option<u32>,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub canceled_by: Option<Uuid>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Appointment {
    /// Last day this appointment occupies.
    pub fn last_day(&self) -> NaiveDate {
        self.end_date.unwrap_or(self.date)
    }

    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.date <= end && start <= self.last_day()
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none() && !INACTIVE_STATUSES.contains(&self.status)
    }

    /// Every day from `date` to `end_date`, inclusive.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let span = (self.last_day() - self.date).num_days().max(0);
        (0..=span).map(move |offset| self.date + Duration::days(offset))
    }
}

/// Who is performing a mutating operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: Uuid,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub modality_id: Uuid,
    pub patient_id: Uuid,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub duration_days: Option<u32>,
    #[serde(default)]
    pub rebook_canceled: bool,
    #[serde(default)]
    pub force: bool,
    pub reason: Option<String>,
    /// Appointment to mark done once this one is booked.
    pub follow_up_of: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub duration_days: Option<u32>,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    pub reason: Option<String>,
}
