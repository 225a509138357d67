use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use modsched_core::models::appointment::Appointment;
use modsched_core::models::force_override::ForceOverride;
use modsched_core::models::resource::Resource;
use modsched_core::models::shift::ShiftDefinition;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbModality {
    pub id: Uuid,
    pub name: String,
    pub slot_type: String,
    pub slot_duration_minutes: Option<i32>,
    pub max_bookable_days: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbModalitySchedule {
    pub id: Uuid,
    pub modality_id: Uuid,
    /// 0 is Monday.
    pub day_of_week: Option<i16>,
    pub date: Option<NaiveDate>,
    pub shift_period: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub patients_per_shift: Option<i32>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAppointment {
    pub id: Uuid,
    pub modality_id: Uuid,
    pub patient_id: Uuid,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub end_date: Option<NaiveDate>,
    pub duration_days: Option<i32>,
    pub status: String,
    pub reason: Option<String>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub canceled_by: Option<Uuid>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbForceOverride {
    pub id: Uuid,
    pub modality_id: Uuid,
    pub user_id: Uuid,
    pub is_able_to_force: bool,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub number_of_patients: Option<i32>,
}

fn unsigned(value: Option<i32>, column: &str) -> Result<Option<u32>> {
    value
        .map(|v| u32::try_from(v).map_err(|_| eyre!("negative value {v} in column {column}")))
        .transpose()
}

/// Convert a count for binding into an `INTEGER` column.
pub fn signed(value: Option<u32>, column: &str) -> Result<Option<i32>> {
    value
        .map(|v| i32::try_from(v).map_err(|_| eyre!("value {v} overflows column {column}")))
        .transpose()
}

pub fn weekday_to_db(day: Weekday) -> i16 {
    day.num_days_from_monday() as i16
}

pub fn weekday_from_db(value: i16) -> Result<Weekday> {
    u8::try_from(value)
        .ok()
        .and_then(|v| Weekday::try_from(v).ok())
        .ok_or_else(|| eyre!("invalid day_of_week {value}"))
}

impl TryFrom<DbModality> for Resource {
    type Error = eyre::Report;

    fn try_from(row: DbModality) -> Result<Self> {
        Ok(Resource {
            id: row.id,
            name: row.name,
            slot_type: row.slot_type.parse().map_err(|e: String| eyre!(e))?,
            slot_duration_minutes: unsigned(row.slot_duration_minutes, "slot_duration_minutes")?,
            max_bookable_days: unsigned(row.max_bookable_days, "max_bookable_days")?,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<DbModalitySchedule> for ShiftDefinition {
    type Error = eyre::Report;

    fn try_from(row: DbModalitySchedule) -> Result<Self> {
        Ok(ShiftDefinition {
            id: row.id,
            resource_id: row.modality_id,
            day_of_week: row.day_of_week.map(weekday_from_db).transpose()?,
            date: row.date,
            shift_period: row.shift_period.parse().map_err(|e: String| eyre!(e))?,
            start_time: row.start_time,
            end_time: row.end_time,
            patients_per_shift: unsigned(row.patients_per_shift, "patients_per_shift")?,
            is_active: row.is_active,
        })
    }
}

impl TryFrom<DbAppointment> for Appointment {
    type Error = eyre::Report;

    fn try_from(row: DbAppointment) -> Result<Self> {
        Ok(Appointment {
            id: row.id,
            resource_id: row.modality_id,
            patient_id: row.patient_id,
            date: row.date,
            time: row.time,
            end_date: row.end_date,
            duration_days: unsigned(row.duration_days, "duration_days")?,
            status: row.status.parse().map_err(|e: String| eyre!(e))?,
            reason: row.reason,
            created_by: row.created_by,
            updated_by: row.updated_by,
            canceled_by: row.canceled_by,
            canceled_at: row.canceled_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

impl TryFrom<DbForceOverride> for ForceOverride {
    type Error = eyre::Report;

    fn try_from(row: DbForceOverride) -> Result<Self> {
        Ok(ForceOverride {
            id: row.id,
            resource_id: row.modality_id,
            user_id: row.user_id,
            is_able_to_force: row.is_able_to_force,
            start_time: row.start_time,
            end_time: row.end_time,
            number_of_patients: unsigned(row.number_of_patients, "number_of_patients")?,
        })
    }
}
