use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use uuid::Uuid;

use crate::models::appointment::{Appointment, AppointmentStatus};
use crate::models::resource::{Resource, SlotType};
use crate::models::shift::{ShiftDefinition, ShiftPeriod};

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
}

pub fn time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").expect("valid time")
}

pub fn at(day: &str, clock: &str) -> NaiveDateTime {
    date(day).and_time(time(clock))
}

pub fn minutes_resource(slot_minutes: Option<u32>) -> Resource {
    Resource {
        id: Uuid::new_v4(),
        name: "CT Scanner".to_string(),
        slot_type: SlotType::Minutes,
        slot_duration_minutes: slot_minutes,
        max_bookable_days: None,
        is_active: true,
        created_at: Utc::now(),
    }
}

pub fn days_resource(max_days: u32) -> Resource {
    Resource {
        id: Uuid::new_v4(),
        name: "Holter Monitor".to_string(),
        slot_type: SlotType::Days,
        slot_duration_minutes: None,
        max_bookable_days: Some(max_days),
        is_active: true,
        created_at: Utc::now(),
    }
}

pub fn shift(
    resource: &Resource,
    day: Weekday,
    period: ShiftPeriod,
    start: &str,
    end: &str,
) -> ShiftDefinition {
    ShiftDefinition {
        id: Uuid::new_v4(),
        resource_id: resource.id,
        day_of_week: Some(day),
        date: None,
        shift_period: period,
        start_time: time(start),
        end_time: time(end),
        patients_per_shift: None,
        is_active: true,
    }
}

pub fn appointment(
    resource: &Resource,
    day: &str,
    clock: Option<&str>,
    duration_days: Option<u32>,
) -> Appointment {
    let start = date(day);
    let end_date = duration_days.map(|d| start + chrono::Duration::days(i64::from(d) - 1));
    Appointment {
        id: Uuid::new_v4(),
        resource_id: resource.id,
        patient_id: Uuid::new_v4(),
        date: start,
        time: clock.map(time),
        end_date,
        duration_days,
        status: AppointmentStatus::Scheduled,
        reason: None,
        created_by: None,
        updated_by: None,
        canceled_by: None,
        canceled_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        deleted_at: None,
    }
}
