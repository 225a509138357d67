//! Day-of-week, duration and force-booking rules.
//!
//! Everything here is checked before any write and never consults storage.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use uuid::Uuid;

use crate::config::SchedulingConfig;
use crate::errors::{ScheduleError, ScheduleResult};
use crate::models::appointment::Actor;
use crate::models::force_override::ForceOverride;
use crate::models::resource::Resource;
use crate::models::shift::{ShiftDefinition, ShiftPeriod};

/// Longest period that may start on a Thursday.
pub const THURSDAY_MAX_DAYS: u32 = 3;

pub fn is_weekend(day: NaiveDate) -> bool {
    matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Whether a single day can open a days-mode period.
pub fn is_date_open(day: NaiveDate, today: NaiveDate, config: &SchedulingConfig) -> bool {
    day >= today
        && day.weekday() != Weekday::Fri
        && !(config.exclude_weekends && is_weekend(day))
}

/// Period lengths that may start on `start`, capped by the modality.
pub fn allowed_durations(resource: &Resource, start: NaiveDate) -> Vec<u32> {
    let longest = match start.weekday() {
        Weekday::Thu => THURSDAY_MAX_DAYS.min(resource.max_days()),
        Weekday::Fri => 0,
        _ => 1,
    };
    (1..=longest).collect()
}

/// Last day of a period of `duration_days` starting on `start`.
pub fn period_end(start: NaiveDate, duration_days: u32) -> ScheduleResult<NaiveDate> {
    start
        .checked_add_days(Days::new(u64::from(duration_days.max(1) - 1)))
        .ok_or_else(|| ScheduleError::DurationNotAllowed {
            duration_days: Some(duration_days),
            reason: "period runs past the last representable date".to_string(),
        })
}

/// Validate a days-mode period and return its length.
///
/// A missing duration means a single day. Only a period starting on a
/// Thursday may run over the following Friday.
pub fn validate_period(
    resource: &Resource,
    start: NaiveDate,
    duration_days: Option<u32>,
    today: NaiveDate,
    config: &SchedulingConfig,
) -> ScheduleResult<u32> {
    let duration = duration_days.unwrap_or(1);

    if start < today {
        return Err(ScheduleError::PastDate {
            date: start,
            time: None,
        });
    }
    if start.weekday() == Weekday::Fri {
        return Err(ScheduleError::FridayNotBookable { date: start });
    }
    if duration == 0 {
        return Err(ScheduleError::DurationNotAllowed {
            duration_days: Some(duration),
            reason: "duration_days must be at least 1".to_string(),
        });
    }

    let end = period_end(start, duration)?;
    let starts_thursday = start.weekday() == Weekday::Thu;
    if !starts_thursday {
        if let Some(friday) = start
            .iter_days()
            .take_while(|d| *d <= end)
            .find(|d| d.weekday() == Weekday::Fri)
        {
            return Err(ScheduleError::FridayNotBookable { date: friday });
        }
    }

    if duration > resource.max_days() {
        return Err(ScheduleError::DurationNotAllowed {
            duration_days: Some(duration),
            reason: format!(
                "modality allows at most {} day(s) per booking",
                resource.max_days()
            ),
        });
    }
    if !starts_thursday && duration > 1 {
        return Err(ScheduleError::DurationNotAllowed {
            duration_days: Some(duration),
            reason: "multi-day bookings must start on a Thursday".to_string(),
        });
    }
    if starts_thursday && duration > THURSDAY_MAX_DAYS {
        return Err(ScheduleError::DurationNotAllowed {
            duration_days: Some(duration),
            reason: format!("Thursday bookings last at most {THURSDAY_MAX_DAYS} days"),
        });
    }

    if config.exclude_weekends {
        if let Some(weekend) = start
            .iter_days()
            .take_while(|d| *d <= end)
            .find(|d| is_weekend(*d))
        {
            return Err(ScheduleError::SlotUnavailable {
                date: weekend,
                time: None,
                reason: "weekends are closed".to_string(),
            });
        }
    }

    Ok(duration)
}

/// Reject a date or slot start that is not in the future.
pub fn ensure_not_past(
    date: NaiveDate,
    time: Option<NaiveTime>,
    now: NaiveDateTime,
) -> ScheduleResult<()> {
    let past = match time {
        Some(t) => date.and_time(t) <= now,
        None => date < now.date(),
    };
    if past {
        return Err(ScheduleError::PastDate { date, time });
    }
    Ok(())
}

/// Admins may always force; everyone else needs an explicit grant.
pub fn can_force(actor: &Actor, grant: Option<&ForceOverride>) -> bool {
    actor.is_admin || grant.is_some_and(|g| g.is_able_to_force)
}

pub fn authorize_force(actor: &Actor, grant: Option<&ForceOverride>) -> ScheduleResult<()> {
    if can_force(actor, grant) {
        Ok(())
    } else {
        Err(ScheduleError::ForcePermissionDenied)
    }
}

/// Synthetic shift spanning the force-booking window for a modality.
///
/// The user's override window wins when it is complete; otherwise the
/// configured default window is used.
pub fn force_window(
    resource_id: Uuid,
    grant: Option<&ForceOverride>,
    config: &SchedulingConfig,
) -> ShiftDefinition {
    let (start, end, patients) = match grant {
        Some(ForceOverride {
            start_time: Some(start),
            end_time: Some(end),
            number_of_patients,
            ..
        }) if start < end => (*start, *end, *number_of_patients),
        _ => (config.force_window_start, config.force_window_end, None),
    };
    ShiftDefinition {
        id: Uuid::nil(),
        resource_id,
        day_of_week: None,
        date: None,
        shift_period: ShiftPeriod::of_time(start),
        start_time: start,
        end_time: end,
        patients_per_shift: patients,
        is_active: true,
    }
}
